/// How long a routine alert stays on screen.
const DEFAULT_DURATION_MS: u64 = 4000;

/// Errors stay longer so they are not missed.
const ERROR_DURATION_MS: u64 = 6000;

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
    Warning,
    Info,
}

impl AlertKind {
    fn default_duration_ms(self) -> u64 {
        match self {
            AlertKind::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }
}

/// A user-facing notice raised by a panel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub text: String,
    pub duration_ms: u64,
}

/// Pending alerts in raise order, with monotonic ids.
///
/// Expiry is the renderer's business; the queue only stores alerts until
/// they are dismissed.
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    alerts: Vec<Alert>,
    next_id: u64,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an alert and returns its id.
    pub fn push(&mut self, kind: AlertKind, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push(Alert {
            id,
            kind,
            text: text.into(),
            duration_ms: kind.default_duration_ms(),
        });
        id
    }

    pub fn success(&mut self, text: impl Into<String>) -> u64 {
        self.push(AlertKind::Success, text)
    }

    pub fn error(&mut self, text: impl Into<String>) -> u64 {
        self.push(AlertKind::Error, text)
    }

    pub fn warning(&mut self, text: impl Into<String>) -> u64 {
        self.push(AlertKind::Warning, text)
    }

    pub fn info(&mut self, text: impl Into<String>) -> u64 {
        self.push(AlertKind::Info, text)
    }

    /// Removes an alert. Returns `true` if it was queued.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    /// Removes and returns every queued alert, oldest first.
    pub fn drain(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    pub fn get(&self, id: u64) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_order_kept() {
        let mut q = AlertQueue::new();
        let a = q.warning("Invalid port (1-65535)");
        let b = q.success("Saved");
        let c = q.error("Cannot reach the device");

        assert_eq!((a, b, c), (0, 1, 2));
        let kinds: Vec<AlertKind> = q.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::Warning, AlertKind::Success, AlertKind::Error]
        );
        assert_eq!(q.latest().unwrap().id, c);
    }

    #[test]
    fn errors_stay_longer() {
        let mut q = AlertQueue::new();
        let ok = q.info("fyi");
        let bad = q.error("nope");

        assert_eq!(q.get(ok).unwrap().duration_ms, 4000);
        assert_eq!(q.get(bad).unwrap().duration_ms, 6000);
    }

    #[test]
    fn dismiss_removes_only_target() {
        let mut q = AlertQueue::new();
        let keep = q.info("keep");
        let gone = q.warning("gone");

        assert!(q.dismiss(gone));
        assert!(!q.dismiss(gone));
        assert_eq!(q.len(), 1);
        assert!(q.get(keep).is_some());
    }

    #[test]
    fn drain_empties_but_ids_keep_counting() {
        let mut q = AlertQueue::new();
        q.info("a");
        q.info("b");

        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert!(q.is_empty());
        assert_eq!(q.success("c"), 2);
    }
}
