/// Append-only record of per-step average batch loss.
///
/// `steps()[i] == i`; both vectors always have the same length. History is only
/// observed (e.g. for plotting) and never fed back into training.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    losses: Vec<f32>,
    steps: Vec<u64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one step's loss and return its step index.
    pub fn push(&mut self, loss: f32) -> u64 {
        let step = self.steps.len() as u64;
        self.losses.push(loss);
        self.steps.push(step);
        step
    }

    #[inline]
    pub fn losses(&self) -> &[f32] {
        &self.losses
    }

    #[inline]
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.losses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    /// Mean of the most recent `n` losses (fewer if the history is shorter).
    pub fn recent_mean(&self, n: usize) -> Option<f32> {
        let start = self.losses.len().saturating_sub(n);
        let tail = &self.losses[start..];
        if tail.is_empty() {
            return None;
        }
        Some(tail.iter().sum::<f32>() / tail.len() as f32)
    }

    pub fn clear(&mut self) {
        self.losses.clear();
        self.steps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_count_from_zero() {
        let mut h = History::new();
        assert_eq!(h.push(1.0), 0);
        assert_eq!(h.push(0.5), 1);
        assert_eq!(h.push(0.25), 2);
        assert_eq!(h.steps(), &[0, 1, 2]);
        assert_eq!(h.losses(), &[1.0, 0.5, 0.25]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn recent_mean_uses_tail() {
        let mut h = History::new();
        assert_eq!(h.recent_mean(3), None);
        for l in [4.0, 2.0, 1.0, 3.0] {
            h.push(l);
        }
        assert_eq!(h.recent_mean(2), Some(2.0));
        assert_eq!(h.recent_mean(100), Some(2.5));

        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.push(1.0), 0);
    }
}
