const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

const MAX_MESSAGES_PLACEHOLDER: &str = "__MAX_VISIBLE_MESSAGES__";

/// Browser dashboard with the row cap filled in
pub fn render_page(max_messages: usize) -> String {
    DASHBOARD_HTML.replace(MAX_MESSAGES_PLACEHOLDER, &max_messages.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_page_injects_cap() {
        let page = render_page(42);
        assert!(page.contains("const maxVisibleMessages = 42;"));
        assert!(!page.contains(MAX_MESSAGES_PLACEHOLDER));
    }

    #[test]
    fn test_page_subscribes_to_stream() {
        assert!(render_page(20).contains("/api/message?stream=true"));
    }
}
