use chrono::DateTime;
use chrono::Utc;

/// Source of the timestamps written into assignment rows.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync
{
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock
{
    fn now(&self) -> DateTime<Utc>
    {
        Utc::now()
    }
}
