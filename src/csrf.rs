use once_cell::sync::Lazy;
use regex::Regex;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_META_NAME: &str = "csrf-token";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Resolves the CSRF token sent with every mutating request.
///
/// Sources are tried in order: the `csrftoken` cookie, the hidden
/// `csrfmiddlewaretoken` form field, then `<meta name="csrf-token">`.
/// When none is present the token is empty and the server rejects the call.
#[derive(Debug, Clone, Default)]
pub struct CsrfTokenAccessor {
    cookie_header: String,
    form_field: Option<String>,
    meta_tag: Option<String>,
}

impl CsrfTokenAccessor {
    pub fn new(cookie_header: &str) -> Self {
        Self {
            cookie_header: cookie_header.to_string(),
            form_field: None,
            meta_tag: None,
        }
    }

    pub fn with_form_field(mut self, value: Option<String>) -> Self {
        if value.is_some() {
            self.form_field = value;
        }
        self
    }

    pub fn with_meta_tag(mut self, value: Option<String>) -> Self {
        if value.is_some() {
            self.meta_tag = value;
        }
        self
    }

    /// 从页面中提取表单字段与meta标签
    pub fn with_page(self, html: &str) -> Self {
        let form_field = find_tag_attr(html, &INPUT_TAG, "name", CSRF_FORM_FIELD, "value");
        let meta_tag = find_tag_attr(html, &META_TAG, "name", CSRF_META_NAME, "content");
        self.with_form_field(form_field).with_meta_tag(meta_tag)
    }

    pub fn token(&self) -> String {
        if let Some(v) = cookie_value(&self.cookie_header, CSRF_COOKIE) {
            return v;
        }
        if let Some(v) = self.form_field.as_ref().filter(|v| !v.is_empty()) {
            return v.clone();
        }
        if let Some(v) = self.meta_tag.as_ref().filter(|v| !v.is_empty()) {
            return v.clone();
        }
        tracing::warn!("没有找到CSRF令牌, 将发送空令牌");
        String::new()
    }
}

fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

static INPUT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<input\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("合法的正则表达式")
});
static META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("合法的正则表达式")
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("合法的正则表达式")
});

// 在匹配的标签中查找 key=key_value 的那一个, 返回其 wanted 属性
fn find_tag_attr(html: &str, tag: &Regex, key: &str, key_value: &str, wanted: &str) -> Option<String> {
    tag.captures_iter(html).find_map(|c| {
        let attrs = attributes(c.get(1).map_or("", |m| m.as_str()));
        let matches = attrs
            .iter()
            .any(|(name, value)| name == key && value == key_value);
        if !matches {
            return None;
        }
        attrs
            .into_iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value)
    })
}

fn attributes(text: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(text)
        .map(|c| {
            let name = c[1].to_ascii_lowercase();
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str())
                .to_string();
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <meta charset="utf-8">
          <meta name="csrf-token" content="from-meta">
        </head><body>
          <form method="post">
            <input type="hidden" name="csrfmiddlewaretoken" value="from-form">
          </form>
        </body></html>"#;

    #[test]
    fn cookie_wins_over_form_and_meta() {
        let accessor = CsrfTokenAccessor::new("sessionid=s1; csrftoken=from-cookie").with_page(PAGE);
        assert_eq!(accessor.token(), "from-cookie");
    }

    #[test]
    fn form_field_wins_over_meta() {
        let accessor = CsrfTokenAccessor::new("sessionid=s1").with_page(PAGE);
        assert_eq!(accessor.token(), "from-form");
    }

    #[test]
    fn meta_tag_is_last_resort() {
        let accessor = CsrfTokenAccessor::new("")
            .with_page(r#"<meta content="only-meta" name="csrf-token"/>"#);
        assert_eq!(accessor.token(), "only-meta");
    }

    #[test]
    fn no_source_yields_empty_token() {
        let accessor = CsrfTokenAccessor::new("sessionid=s1; csrftoken=").with_page("<p>nothing</p>");
        assert_eq!(accessor.token(), "");
    }

    #[test]
    fn similarly_named_cookie_is_ignored() {
        let accessor = CsrfTokenAccessor::new("xcsrftoken=nope")
            .with_form_field(Some("configured".to_string()));
        assert_eq!(accessor.token(), "configured");
    }

    #[test]
    fn data_attributes_do_not_shadow_real_ones() {
        let html = r#"<input data-name="csrfmiddlewaretoken" name="other" value="x"><input name="csrfmiddlewaretoken" value='real'>"#;
        let accessor = CsrfTokenAccessor::new("").with_page(html);
        assert_eq!(accessor.token(), "real");
    }

    #[test]
    fn tag_and_attribute_names_are_case_insensitive() {
        let accessor = CsrfTokenAccessor::new("")
            .with_page(r#"<INPUT type="hidden" NAME="csrfmiddlewaretoken" VALUE="tok">"#);
        assert_eq!(accessor.token(), "tok");
    }

    #[test]
    fn name_inside_another_value_is_not_an_attribute() {
        let accessor = CsrfTokenAccessor::new("")
            .with_page(r#"<input title="set name=x" name="csrfmiddlewaretoken" value="tok">"#);
        assert_eq!(accessor.token(), "tok");
    }

    #[test]
    fn closing_bracket_inside_quoted_value_stays_in_the_tag() {
        let accessor = CsrfTokenAccessor::new("")
            .with_page(r#"<meta data-note="a > b" name="csrf-token" content=unquoted>"#);
        assert_eq!(accessor.token(), "unquoted");
    }
}
