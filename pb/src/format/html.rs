//! HTML layout for notebook display handles

use super::{counts, throughput, time_block};
use crate::estimator::Estimate;
use crate::tracker::{DisplayStatus, ProgressState};

fn css_color(status: DisplayStatus) -> &'static str {
    match status {
        DisplayStatus::Running => "var(--jp-brand-color1)",
        DisplayStatus::Error => "var(--jp-error-color1)",
        DisplayStatus::Interrupted => "var(--jp-warn-color0)",
        DisplayStatus::Done => "var(--jp-success-color1)",
        DisplayStatus::Stopped => "var(--jp-warn-color1)",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn bar_html(fraction: f64, status: DisplayStatus, width: &str) -> String {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    format!(
        r#"<div style="width: {width}; height: 1.5em; background: var(--jp-layout-color2); position: relative;"><div style="left: 0; right: {right:.1}%; top: 0; bottom: 0; background-color: {color}; position: absolute;"></div></div>"#,
        right = 100.0 - 100.0 * fraction,
        color = css_color(status),
    )
}

/// Flex row of status, percentage, bar, counts, time and description
///
/// Unknown totals get a small full-width indicator instead of a real bar.
pub fn render_html(state: &ProgressState, estimate: &Estimate) -> String {
    let status = state.display_status();
    let (percent, bar) = match state.fraction() {
        Some(fraction) => (format!("{:.1}%", fraction * 100.0), bar_html(fraction, status, "300px")),
        None => (String::new(), bar_html(1.0, status, "40px")),
    };
    let time = escape(&format!("[{},\t{}]", time_block(state, estimate), throughput(estimate)));
    let error = state
        .error_detail
        .as_deref()
        .map(|detail| format!("<pre style='color:red'>{}</pre>", escape(detail)))
        .unwrap_or_default();

    let cell = "white-space: nowrap;";
    format!(
        "<div style=\"display:flex; flex-direction:column;\">\
<div style=\"display:flex; gap:1em; align-items: center;\">\
<div style='{cell}'>{status}</div>\
<div style='{cell} width: 5em;'>{percent}</div>\
<div style='{cell}'>{bar}</div>\
<div style='{cell}'>{counts}</div>\
<div style='{cell}'>{time}</div>\
<div style='{cell}'>{desc}</div>\
</div>{error}</div>",
        desc = escape(&state.description),
        counts = counts(state),
        status = status.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_known_total() {
        let mut state = ProgressState::new(Some(4), "epoch");
        state.count = 1;
        let html = render_html(&state, &Estimate::default());

        assert!(html.contains(">25.0%<"));
        assert!(html.contains("width: 300px"));
        assert!(html.contains("right: 75.0%"));
        assert!(html.contains(">1/4<"));
        assert!(html.contains(">running<"));
        assert!(html.contains("var(--jp-brand-color1)"));
    }

    #[test]
    fn test_html_unknown_total_uses_small_indicator() {
        let mut state = ProgressState::new(None, "stream");
        state.count = 7;
        let html = render_html(&state, &Estimate::default());

        assert!(html.contains("width: 40px"));
        assert!(html.contains("right: 0.0%"));
        assert!(html.contains("width: 5em;'></div>"));
        assert!(html.contains(">7<"));
    }

    #[test]
    fn test_html_error_block_is_escaped() {
        let mut state = ProgressState::new(Some(2), "<b>job</b>");
        state.fail("expected <value>");
        let html = render_html(&state, &Estimate::default());

        assert!(html.contains("&lt;b&gt;job&lt;/b&gt;"));
        assert!(html.contains("<pre style='color:red'>expected &lt;value&gt;</pre>"));
        assert!(html.contains(">error<"));
        assert!(html.contains("var(--jp-error-color1)"));
    }

    #[test]
    fn test_html_columns_follow_text_order() {
        let mut state = ProgressState::new(Some(4), "epoch");
        state.count = 2;
        let html = render_html(&state, &Estimate::default());

        let status = html.find(">running<").expect("status cell");
        let percent = html.find(">50.0%<").expect("percent cell");
        let counts = html.find(">2/4<").expect("counts cell");
        let desc = html.find(">epoch<").expect("description cell");
        assert!(status < percent && percent < counts && counts < desc);
    }

    #[test]
    fn test_html_status_colors_are_distinct() {
        let statuses = [
            DisplayStatus::Running,
            DisplayStatus::Error,
            DisplayStatus::Interrupted,
            DisplayStatus::Done,
            DisplayStatus::Stopped,
        ];
        let colors: std::collections::HashSet<_> = statuses.iter().map(|s| css_color(*s)).collect();
        assert_eq!(colors.len(), statuses.len());
    }
}
