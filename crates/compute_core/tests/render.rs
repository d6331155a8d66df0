use compute_core::{
    render, ItemAddress, MemoryResultStore, PresentationConfig, ResultStore, TextColor,
    ABSENT_MARKER,
};
use pretty_assertions::assert_eq;

fn config() -> PresentationConfig {
    PresentationConfig {
        text_color: TextColor::Red,
        addresses: vec![
            ItemAddress::new("cat_a", "item_1"),
            ItemAddress::new("cat_a", "item_2"),
        ],
    }
}

#[test]
fn rows_follow_config_order_and_mark_absent_results() {
    let store = MemoryResultStore::new();
    store.set(&ItemAddress::new("cat_a", "item_2"), "Y").unwrap();

    let listing = render(&config(), &store).unwrap();

    assert_eq!(listing.text_color, TextColor::Red);
    assert_eq!(
        listing.lines(),
        vec![
            format!("cat_a, item_1: {ABSENT_MARKER}"),
            "cat_a, item_2: Y".to_string(),
        ]
    );
    assert_eq!(listing.pending(), 1);
}

#[test]
fn each_render_reads_a_fresh_snapshot() {
    let store = MemoryResultStore::new();
    let before = render(&config(), &store).unwrap();
    assert_eq!(before.pending(), 2);

    store.set(&ItemAddress::new("cat_a", "item_1"), "X").unwrap();
    store.set(&ItemAddress::new("cat_a", "item_2"), "Y").unwrap();
    let after = render(&config(), &store).unwrap();

    assert_eq!(after.pending(), 0);
    assert_eq!(after.lines(), vec!["cat_a, item_1: X", "cat_a, item_2: Y"]);
}
