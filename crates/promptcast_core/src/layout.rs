//! Inline/overflow split for the prompt action bar.
use crate::PromptTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub id: String,
    pub label: String,
}

/// Actions for every template flagged `show_in_menu`, in template order.
pub fn menu_actions(templates: &[PromptTemplate]) -> Vec<ActionDescriptor> {
    templates
        .iter()
        .filter(|template| template.show_in_menu)
        .map(|template| ActionDescriptor {
            id: template.id.clone(),
            label: template.name.clone(),
        })
        .collect()
}

/// Pixel spacing used while fitting actions into the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    /// Space between two adjacent items.
    pub gap: u32,
    /// Width of the "more" affordance.
    pub more_width: u32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            gap: 6,
            more_width: 32,
        }
    }
}

/// Index of the first action that does not fit inline.
///
/// Each action costs its width plus one gap. Room for the "more" affordance
/// is reserved unless the action being placed is the last one.
pub fn compute_split(widths: &[u32], container_width: u32, metrics: LayoutMetrics) -> usize {
    let container = u64::from(container_width);
    let mut used: u64 = 0;
    for (index, width) in widths.iter().enumerate() {
        let is_last = index + 1 == widths.len();
        let reserve = if is_last {
            0
        } else {
            u64::from(metrics.gap) + u64::from(metrics.more_width)
        };
        if used + u64::from(*width) + reserve > container {
            return index;
        }
        used += u64::from(*width) + u64::from(metrics.gap);
    }
    widths.len()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionLayout {
    pub container_width: u32,
    pub inline: Vec<ActionDescriptor>,
    pub overflow: Vec<ActionDescriptor>,
}

impl ActionLayout {
    /// Measures every action first, then builds both sets from scratch.
    pub fn compute<F>(
        actions: &[ActionDescriptor],
        container_width: u32,
        metrics: LayoutMetrics,
        measure: F,
    ) -> Self
    where
        F: Fn(&ActionDescriptor) -> u32,
    {
        let widths: Vec<u32> = actions.iter().map(measure).collect();
        let split = compute_split(&widths, container_width, metrics);
        let (inline, overflow) = actions.split_at(split);
        Self {
            container_width,
            inline: inline.to_vec(),
            overflow: overflow.to_vec(),
        }
    }

    pub fn split_index(&self) -> usize {
        self.inline.len()
    }

    pub fn shows_more(&self) -> bool {
        !self.overflow.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: LayoutMetrics = LayoutMetrics {
        gap: 10,
        more_width: 30,
    };

    #[test]
    fn everything_fits_in_a_wide_bar() {
        assert_eq!(compute_split(&[50, 50, 50], 1000, METRICS), 3);
    }

    #[test]
    fn last_item_does_not_reserve_the_more_button() {
        // 50+10 + 50+10 + 50 = 170: fits exactly without the reservation.
        assert_eq!(compute_split(&[50, 50, 50], 170, METRICS), 3);
        assert_eq!(compute_split(&[50, 50, 50], 169, METRICS), 2);
    }

    #[test]
    fn reserves_room_for_more_before_the_last_item() {
        // Second item needs 60 + 50 + 10 + 30 = 150.
        assert_eq!(compute_split(&[50, 50, 50], 149, METRICS), 1);
    }

    #[test]
    fn empty_and_zero_width() {
        assert_eq!(compute_split(&[], 0, METRICS), 0);
        assert_eq!(compute_split(&[1, 1], 0, METRICS), 0);
    }

    #[test]
    fn narrowing_never_adds_inline_items() {
        let widths = [40, 75, 20, 90, 33, 61, 12];
        let mut previous = usize::MAX;
        for width in (0..=500).rev() {
            let split = compute_split(&widths, width, METRICS);
            assert!(split <= previous, "split grew at width {width}");
            previous = split;
        }
    }
}
