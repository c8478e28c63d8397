use axum::{extract::State, response::Html};

use crate::{analysis::UNAVAILABLE_MESSAGE, app::AppState};

const FORM_TEMPLATE: &str = include_str!("../resources/index.html");
const BODY_PLACEHOLDER: &str = "{{BODY}}";

const FORM_BODY: &str = r#"<textarea id="comment" rows="7" placeholder="Type something..."></textarea>
    <button id="analyze" type="button">Analyze Comment</button>
    <section id="result" hidden>
      <hr>
      <progress id="progress" max="100" value="0"></progress>
      <p>Toxicity Score: <strong id="score"></strong></p>
      <div id="banner" class="banner"></div>
      <div id="hint" class="banner warning" hidden></div>
    </section>"#;

/// 入力フォームを返す。モデルが無い場合はフォームの代わりに設定エラーを表示する。
pub(crate) async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render(state.analyzer().is_available()))
}

fn render(available: bool) -> String {
    let body = if available {
        FORM_BODY.to_string()
    } else {
        format!(r#"<div class="banner error">{UNAVAILABLE_MESSAGE}</div>"#)
    };
    FORM_TEMPLATE.replace(BODY_PLACEHOLDER, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_is_rendered_when_model_is_available() {
        let page = render(true);
        assert!(page.contains("RespectGuard AI"));
        assert!(page.contains("Analyze Comment"));
        assert!(!page.contains(BODY_PLACEHOLDER));
        assert!(!page.contains(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn approval_triggers_balloons() {
        let page = render(true);
        assert!(page.contains(r#"if (result.status === "approved") {"#));
        assert!(page.contains("function celebrate()"));
        assert!(page.contains("@keyframes rise"));
    }

    #[test]
    fn configuration_error_replaces_form() {
        let page = render(false);
        assert!(page.contains(UNAVAILABLE_MESSAGE));
        assert!(!page.contains("<textarea"));
    }
}
