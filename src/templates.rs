//! Server-rendered pages. Templates are embedded at compile time and receive
//! plain data structures plus session-derived values (user, flash, nonce).

use minijinja::Environment;

pub fn build_env() -> Environment<'static> {
    let mut env = Environment::new();
    for (name, source) in [
        ("base.html", include_str!("../templates/base.html")),
        ("main.html", include_str!("../templates/main.html")),
        (
            "category_detail.html",
            include_str!("../templates/category_detail.html"),
        ),
        (
            "item_detail.html",
            include_str!("../templates/item_detail.html"),
        ),
        (
            "create_item.html",
            include_str!("../templates/create_item.html"),
        ),
        ("edit_item.html", include_str!("../templates/edit_item.html")),
        (
            "delete_item.html",
            include_str!("../templates/delete_item.html"),
        ),
    ] {
        env.add_template(name, source)
            .expect("FATAL: bundled template failed to parse");
    }
    env
}
