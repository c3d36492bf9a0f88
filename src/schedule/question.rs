//! The fixed question menu

/// Questions a logged-in participant can ask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Question {
    NextActivity,
    AllActivities,
    ZoomLink,
    Countdown,
    DailyEncouragement,
    LastUpdated,
}

impl Question {
    /// Every question, in menu order. All of these labels are reserved and
    /// cannot be submitted as feedback.
    pub const ALL: [Question; 6] = [
        Question::NextActivity,
        Question::AllActivities,
        Question::ZoomLink,
        Question::Countdown,
        Question::DailyEncouragement,
        Question::LastUpdated,
    ];

    /// Button label shown on the reply keyboard
    pub fn label(self) -> &'static str {
        match self {
            Question::NextActivity => "Next NDP activity?",
            Question::AllActivities => "Show all NDP activities",
            Question::ZoomLink => "Zoom link?",
            Question::Countdown => "Countdown",
            Question::DailyEncouragement => "Daily encouragement",
            Question::LastUpdated => "Last updated?",
        }
    }

    /// Exact label match
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.label() == text)
    }

    /// Whether the rendered answer uses Telegram Markdown
    pub fn is_markdown(self) -> bool {
        matches!(
            self,
            Question::NextActivity | Question::AllActivities | Question::Countdown
        )
    }

    /// Config name, as used by `NAMJA_MENU`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "next" => Some(Question::NextActivity),
            "all" => Some(Question::AllActivities),
            "zoom" => Some(Question::ZoomLink),
            "countdown" => Some(Question::Countdown),
            "encouragement" => Some(Question::DailyEncouragement),
            "updated" => Some(Question::LastUpdated),
            _ => None,
        }
    }
}
