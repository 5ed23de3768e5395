/// Named `[:class:]` macros and the sub-patterns they expand to.

/// Expansion for a macro name, or `None` if the name is unknown.
pub fn expand(name: &str) -> Option<&'static str> {
    let expanded = match name {
        "alnum" => "[a-zA-Z0-9]",
        "alpha" => "[a-zA-Z]",
        "upper" => "[A-Z]",
        "lower" => "[a-z]",
        "digit" => "[0-9]",
        "xdigit" => "[A-F0-9a-f]",
        "space" => "[ \\t\\r\\n\\v\\f]",
        "blank" => "[ \\t]",
        "print" => "[\\x20-\\x7E]",
        "graph" => "[\\x21-\\x7E]",
        "punct" => "[!-/:-@\\[-`{-~]",
        "cntrl" => "[\\x00-\\x1F\\x7F]",
        "guid" => "[A-F0-9]{8}(?:-[A-F0-9]{4}){3}-[A-F0-9]{12}",
        _ => return None,
    };
    Some(expanded)
}
