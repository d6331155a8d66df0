use std::path::Path;

use compute_core::ReconcileMode;

pub(crate) const HELP: &[&str] = &[
    "Commands:",
    "  category <name>           switch category",
    "  select <item> [<item>...] choose items of the current category",
    "  color <black|red|blue>    change the listing color",
    "  clear                     clear the result cache",
    "  show                      print the debug view",
    "  help                      print this list",
    "  quit                      save the selection and exit",
];

pub(crate) fn banner(data_dir: &Path, mode: ReconcileMode) -> Vec<String> {
    let mode = match mode {
        ReconcileMode::Push => "push",
        ReconcileMode::Poll => "poll",
    };
    vec![
        format!("compute_app: results in {}, {mode} reconciliation", data_dir.display()),
        "Type `help` for commands.".to_string(),
    ]
}
