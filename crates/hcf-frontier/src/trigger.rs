/// One-shot guard for the follow-up job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowUpTrigger {
    requested: bool,
    triggered: bool,
}

impl FollowUpTrigger {
    pub fn new(requested: bool) -> Self {
        Self {
            requested,
            triggered: false,
        }
    }

    pub fn should_trigger(&self) -> bool {
        self.requested && !self.triggered
    }

    pub fn mark_triggered(&mut self) {
        self.triggered = true;
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut trigger = FollowUpTrigger::new(true);
        assert!(trigger.should_trigger());
        trigger.mark_triggered();
        assert!(!trigger.should_trigger());
        trigger.mark_triggered();
        assert!(!trigger.should_trigger());
        assert!(trigger.is_triggered());
    }

    #[test]
    fn test_not_requested() {
        let trigger = FollowUpTrigger::new(false);
        assert!(!trigger.should_trigger());
        assert!(!trigger.is_triggered());
    }
}
