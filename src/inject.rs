//! The Userbin client script and the placeholder login page.
//!
//! HTML pages get a `<script>` tag loading the Userbin client, inserted just
//! before `</body>`. The client reads `loginRedirectUrl` to know where to
//! send the browser after a successful login.

use crate::GateConfig;

/// Minimal page served with a 403 when an anonymous request hits the
/// protected path. The Userbin client renders its login form into the anchor.
pub const LOGIN_HTML: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
\x20 <title>Log in</title>\n\
</head>\n\
<body>\n\
<a class=\"ub-login-form\"></a>\n\
</body>\n\
</html>\n";

const BODY_CLOSE: &str = "</body>";

#[derive(Debug, Clone)]
pub struct ScriptInjector {
    app_id: String,
    script_url: String,
    root_path: Option<String>,
    protected_path: Option<String>,
    skip: bool,
}

impl ScriptInjector {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            app_id: config.app_id().to_owned(),
            script_url: config.script_url().to_owned(),
            root_path: config.root_path().map(ToOwned::to_owned),
            protected_path: config.protected_path().map(ToOwned::to_owned),
            skip: config.skip_script_injection(),
        }
    }

    /// True when `skip_script_injection` is set. Only regular responses
    /// honour it; the login page always carries the script.
    pub fn skips_injection(&self) -> bool {
        self.skip
    }

    /// Renders the script tags.
    ///
    /// `login_path` becomes `loginRedirectUrl`; without one the protected
    /// path is used.
    pub fn script_tag(&self, login_path: Option<&str>) -> String {
        let mut tag = format!(
            "<script src='{}?{}'></script>",
            escape_js(&self.script_url),
            escape_js(&self.app_id)
        );
        tag.push_str("<script type='text/javascript'>Userbin.config({");

        if let Some(root) = &self.root_path {
            tag.push_str(&format!("logoutRedirectUrl:'{}',", escape_js(root)));
        }
        if let Some(path) = login_path.filter(|p| !p.is_empty()).or(self.protected_path.as_deref()) {
            tag.push_str(&format!("loginRedirectUrl:'{}',", escape_js(path)));
        }

        tag.push_str("reloadOnSuccess:true});</script>");
        tag
    }

    /// Inserts the script before the first `</body>`. Bodies without one are
    /// returned unchanged.
    pub fn inject(&self, body: &str, login_path: Option<&str>) -> String {
        match body.find(BODY_CLOSE) {
            Some(position) => {
                let tag = self.script_tag(login_path);
                let mut out = String::with_capacity(body.len() + tag.len());
                out.push_str(&body[..position]);
                out.push_str(&tag);
                out.push_str(&body[position..]);
                out
            }
            None => body.to_owned(),
        }
    }

    /// The 403 page, redirecting back to `redirect_to` after login.
    pub fn login_page(&self, redirect_to: &str) -> String {
        self.inject(LOGIN_HTML, Some(redirect_to))
    }
}

/// Escapes a value for a single-quoted JavaScript string inside a `<script>`.
fn escape_js(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\x3c"),
            '>' => out.push_str("\\x3e"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
