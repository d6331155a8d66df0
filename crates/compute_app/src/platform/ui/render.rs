use compute_core::{AppViewModel, ItemAddress, Listing, PollPhase};

use super::constants::{ansi_color, ANSI_RESET};

/// Status block plus the result listing.
pub(crate) fn render(view: &AppViewModel, listing: Option<&Listing>) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "Category: {} of [{}]",
        view.category.as_deref().unwrap_or("-"),
        view.categories.join(", ")
    ));
    lines.push(format!(
        "Selected: [{}] of [{}]",
        view.selected_items.join(", "),
        view.available_items.join(", ")
    ));
    lines.push(format!("Status: {}", status_text(view)));

    match listing {
        Some(listing) => {
            let color = ansi_color(listing.text_color);
            for line in listing.lines() {
                lines.push(match color {
                    Some(code) => format!("  {code}{line}{ANSI_RESET}"),
                    None => format!("  {line}"),
                });
            }
        }
        None => lines.push("  (results unavailable)".to_string()),
    }

    if let Some(failure) = &view.last_failure {
        lines.push(format!("Last failure: {failure}"));
    }
    if let Some(error) = &view.last_error {
        lines.push(format!("Error: {error}"));
    }
    lines
}

/// Everything the view model knows, for the `show` command.
pub(crate) fn render_debug(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![
        format!("mode: {:?}", view.mode),
        format!(
            "presentation: color={} items=[{}]",
            view.presentation.text_color.as_str(),
            join_addresses(&view.presentation.addresses)
        ),
    ];

    lines.push(match &view.active_plan {
        Some(plan) => format!(
            "active plan: batch {} [{}]",
            plan.batch_id(),
            join_addresses(plan.addresses())
        ),
        None => "active plan: none".to_string(),
    });
    lines.push(format!("computing: {}", view.computing));
    lines.push(match &view.last_completed {
        Some(done) => format!(
            "last completed: batch {} [{}]",
            done.batch_id,
            join_addresses(&done.addresses)
        ),
        None => "last completed: none".to_string(),
    });
    lines.push(format!(
        "last failure: {}",
        view.last_failure.as_deref().unwrap_or("none")
    ));

    let phase = match view.poll_phase {
        PollPhase::Idle => "idle",
        PollPhase::Polling => "polling",
    };
    lines.push(match &view.polling {
        Some(snapshot) => format!(
            "polling ({phase}): batch {} missing [{}]",
            snapshot.compute_timestamp,
            join_addresses(&snapshot.missing)
        ),
        None => format!("polling ({phase}): no snapshot"),
    });
    lines
}

fn status_text(view: &AppViewModel) -> String {
    match (&view.progress, view.computing) {
        (Some(progress), true) => format!(
            "computing batch {} ({}/{})",
            progress.batch_id, progress.completed, progress.total
        ),
        (None, true) => "computing".to_string(),
        (_, false) => "idle".to_string(),
    }
}

fn join_addresses(addresses: &[ItemAddress]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_core::{
        BatchProgressView, ComputationPlan, ListingRow, PresentationConfig, ReconcileMode,
        TextColor,
    };
    use pretty_assertions::assert_eq;

    fn addr(item: &str) -> ItemAddress {
        ItemAddress::new("cat_a", item)
    }

    fn view() -> AppViewModel {
        AppViewModel {
            mode: ReconcileMode::Push,
            categories: vec!["cat_a".into(), "cat_b".into()],
            category: Some("cat_a".into()),
            available_items: vec!["item_1".into(), "item_2".into()],
            selected_items: vec!["item_1".into(), "item_2".into()],
            presentation: PresentationConfig {
                text_color: TextColor::Black,
                addresses: vec![addr("item_1"), addr("item_2")],
            },
            ..AppViewModel::default()
        }
    }

    fn listing(color: TextColor) -> Listing {
        Listing {
            text_color: color,
            rows: vec![
                ListingRow {
                    address: addr("item_1"),
                    result: Some("COMPUTED#cat_a_item_1".into()),
                },
                ListingRow {
                    address: addr("item_2"),
                    result: None,
                },
            ],
        }
    }

    #[test]
    fn listing_rows_follow_the_status_block() {
        let mut view = view();
        view.computing = true;
        view.progress = Some(BatchProgressView {
            batch_id: 3,
            completed: 1,
            total: 2,
        });

        let lines = render(&view, Some(&listing(TextColor::Black)));

        assert_eq!(
            lines,
            vec![
                "Category: cat_a of [cat_a, cat_b]".to_string(),
                "Selected: [item_1, item_2] of [item_1, item_2]".to_string(),
                "Status: computing batch 3 (1/2)".to_string(),
                "  cat_a, item_1: COMPUTED#cat_a_item_1".to_string(),
                "  cat_a, item_2: None".to_string(),
            ]
        );
    }

    #[test]
    fn colored_rows_are_wrapped_in_escapes() {
        let lines = render(&view(), Some(&listing(TextColor::Red)));
        assert_eq!(lines[3], "  \x1b[31mcat_a, item_1: COMPUTED#cat_a_item_1\x1b[0m");
        assert_eq!(lines[2], "Status: idle");
    }

    #[test]
    fn debug_view_lists_the_active_plan() {
        let mut view = view();
        view.active_plan = Some(ComputationPlan::new(7, vec![addr("item_2")]));
        view.computing = true;

        let lines = render_debug(&view);

        assert_eq!(lines[2], "active plan: batch 7 [cat_a/item_2]");
        assert_eq!(lines[3], "computing: true");
        assert_eq!(lines[6], "polling (idle): no snapshot");
    }
}
