//! Page scripts evaluated in the browser by [`super::ChromiumSite`].
//!
//! Selectors are embedded as JSON string literals so quotes inside XPath
//! attribute predicates cannot break out of the script.

fn js_string(value: &str) -> String {
    // A &str always serializes; the fallback keeps this total.
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_owned())
}

fn first_node(xpath: &str) -> String {
    format!(
        "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
        js_string(xpath)
    )
}

/// `true` when a CSS selector matches anything in the document.
pub(super) fn css_present(css: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(css))
}

/// Empties the value of the element matched by `css`.
pub(super) fn clear_input(css: &str) -> String {
    format!(
        "(function() {{ const el = document.querySelector({}); if (el) {{ el.value = ''; }} return el !== null; }})()",
        js_string(css)
    )
}

/// `true` when an XPath matches anything in the document.
pub(super) fn xpath_present(xpath: &str) -> String {
    format!("({}) !== null", first_node(xpath))
}

/// `{text}` holding the `innerText` of the first node matching `xpath`, or
/// `null` when nothing matches. Wrapped in an object because a bare `null`
/// result carries no value over the protocol.
pub(super) fn xpath_text(xpath: &str) -> String {
    format!(
        "(function() {{ const node = {}; return {{ text: node ? node.innerText : null }}; }})()",
        first_node(xpath)
    )
}

/// Clicks the first node matching `xpath`; evaluates to whether one existed.
pub(super) fn xpath_click(xpath: &str) -> String {
    format!(
        "(function() {{ const node = {}; if (!node) {{ return false; }} node.click(); return true; }})()",
        first_node(xpath)
    )
}

/// `[{link, name}]` for every node matching `entries_xpath`, reading the
/// `content` attribute of the link and name elements inside each entry.
pub(super) fn result_entries(entries_xpath: &str, link_css: &str, name_css: &str) -> String {
    format!(
        concat!(
            "(function() {{ ",
            "const snapshot = document.evaluate({xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); ",
            "const entries = []; ",
            "for (let i = 0; i < snapshot.snapshotLength; i++) {{ ",
            "const node = snapshot.snapshotItem(i); ",
            "const link = node.querySelector({link}); ",
            "const name = node.querySelector({name}); ",
            "entries.push({{ link: link ? link.getAttribute('content') : null, name: name ? name.getAttribute('content') : null }}); ",
            "}} ",
            "return entries; ",
            "}})()"
        ),
        xpath = js_string(entries_xpath),
        link = js_string(link_css),
        name = js_string(name_css),
    )
}
