use chrono::{DateTime, Duration, Utc};

/// Note attached to sessions that were finished because nobody answered the
/// long-session prompt.
pub const AUTO_FINISH_NOTE: &str = "Treino finalizado automaticamente por inatividade.";

/// Thresholds for workouts that were probably left running.
///
/// Once a draft is older than `warning_after`, the user is prompted. Without an
/// answer within `countdown`, the workout is finished automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongSessionPolicy {
    pub warning_after: Duration,
    pub countdown: Duration,
}

impl Default for LongSessionPolicy {
    fn default() -> Self {
        Self {
            warning_after: Duration::minutes(90),
            countdown: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inactivity {
    Active,
    Prompt { deadline: DateTime<Utc> },
    Expired,
}

impl LongSessionPolicy {
    /// `since` is the start of the draft or the last time the user confirmed
    /// they are still training. `prompted_at` is when the current prompt was
    /// shown, if any.
    #[must_use]
    pub fn check(
        &self,
        since: DateTime<Utc>,
        prompted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Inactivity {
        if now - since < self.warning_after {
            return Inactivity::Active;
        }
        match prompted_at {
            None => Inactivity::Prompt {
                deadline: now + self.countdown,
            },
            Some(prompted_at) if now >= prompted_at + self.countdown => Inactivity::Expired,
            Some(prompted_at) => Inactivity::Prompt {
                deadline: prompted_at + self.countdown,
            },
        }
    }
}
