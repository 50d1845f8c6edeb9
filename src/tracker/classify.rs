/// Kind of channel membership change carried by a presence event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Not in voice before, in a channel now
    Join,
    /// In a channel before, not in voice now
    Leave,
    /// Switched directly between two channels
    Move,
    /// No channel change (mute, deafen, stream toggles, ...)
    None,
}

/// Classify a presence change by its before/after channel ids.
pub fn classify(previous_channel_id: Option<&str>, next_channel_id: Option<&str>) -> Transition {
    match (previous_channel_id, next_channel_id) {
        (None, Some(_)) => Transition::Join,
        (Some(_), None) => Transition::Leave,
        (Some(prev), Some(next)) if prev != next => Transition::Move,
        _ => Transition::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_join_and_leave() {
        assert_eq!(classify(None, Some("123")), Transition::Join);
        assert_eq!(classify(Some("123"), None), Transition::Leave);
    }

    #[test]
    fn test_classify_move() {
        assert_eq!(classify(Some("123"), Some("456")), Transition::Move);
    }

    #[test]
    fn test_classify_no_change() {
        assert_eq!(classify(Some("123"), Some("123")), Transition::None);
        assert_eq!(classify(None, None), Transition::None);
    }
}
