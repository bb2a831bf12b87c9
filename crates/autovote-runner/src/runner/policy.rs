/// Position to check in a group of `option_count` options.
///
/// The configured index when the group is large enough, otherwise the last
/// option. `None` for an empty group.
pub fn select(option_count: usize, choice_index: usize) -> Option<usize> {
    if choice_index < option_count {
        Some(choice_index)
    } else {
        option_count.checked_sub(1)
    }
}
