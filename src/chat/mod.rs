use chrono::{Local, NaiveTime, Timelike};

pub mod transcript;

pub use transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn avatar(self) -> &'static str {
        match self {
            Self::User => "👤",
            Self::Bot => "🏥",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: clock_label(Local::now().time()),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n').map(|line| line.trim_end_matches('\r'))
    }
}

pub fn clock_label(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

#[cfg(test)]
mod tests {
    use super::{clock_label, Message, Sender};
    use chrono::NaiveTime;

    #[test]
    fn clock_label_pads_hours_and_minutes() {
        let time = NaiveTime::from_hms_opt(7, 5, 59).expect("valid time");
        assert_eq!(clock_label(time), "07:05");
    }

    #[test]
    fn clock_label_uses_24_hour_clock() {
        let time = NaiveTime::from_hms_opt(23, 40, 0).expect("valid time");
        assert_eq!(clock_label(time), "23:40");
    }

    #[test]
    fn message_lines_break_on_newlines() {
        let message = Message::new(Sender::Bot, "Hello!\r\n\nTry asking");
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines, vec!["Hello!", "", "Try asking"]);
    }

    #[test]
    fn message_timestamp_is_hh_mm() {
        let message = Message::new(Sender::User, "hi");
        assert_eq!(message.timestamp.len(), 5);
        assert_eq!(message.timestamp.as_bytes()[2], b':');
    }
}
