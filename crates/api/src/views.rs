//! HTML pages rendered with minijinja.
//!
//! Templates are compiled into the binary and registered once at startup.
//! Their `.html` names switch on HTML auto-escaping, so model text, solver
//! output and the prefill value are always escaped.

use axum::response::Html;
use minijinja::{context, Environment};
use zimplay_store::JobSnapshot;

const INPUT_TEMPLATE: &str = "input.html";
const RESULT_TEMPLATE: &str = "result.html";

/// Seconds between automatic reloads of an unfinished result page.
pub const RESULT_REFRESH_SECS: u64 = 5;

/// Registered page templates.
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INPUT_TEMPLATE, include_str!("../templates/input.html"))?;
        env.add_template(RESULT_TEMPLATE, include_str!("../templates/result.html"))?;
        Ok(Self { env })
    }

    /// Submission form, optionally pre-filled with model text.
    pub fn input(&self, prefilled: &str) -> Result<Html<String>, minijinja::Error> {
        let page = self
            .env
            .get_template(INPUT_TEMPLATE)?
            .render(context! { prefilled })?;
        Ok(Html(page))
    }

    /// Result page for a job at the moment `snapshot` was taken.
    pub fn result(&self, snapshot: &JobSnapshot) -> Result<Html<String>, minijinja::Error> {
        let page = self.env.get_template(RESULT_TEMPLATE)?.render(context! {
            fingerprint => snapshot.fingerprint.as_str(),
            model => &snapshot.model,
            solution => &snapshot.solution,
            log => &snapshot.log,
            state => snapshot.state.to_string(),
            ready => snapshot.is_ready(),
            refresh_secs => RESULT_REFRESH_SECS,
        })?;
        Ok(Html(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_escapes_prefilled_text() {
        let views = Views::new().unwrap();
        let Html(page) = views.input("</textarea><script>x</script>").unwrap();

        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(!page.contains("</textarea><"));
        assert!(page.contains(r#"action="/solve/""#));
    }

    #[test]
    fn input_without_prefill_has_empty_textarea() {
        let views = Views::new().unwrap();
        let Html(page) = views.input("").unwrap();

        assert!(page.contains(r#"<textarea name="model" rows="24" cols="80"></textarea>"#));
    }
}
