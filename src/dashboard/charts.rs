//! The trend chart: a bar per recent transaction, green for income and red
//! for spending.
//!
//! The chart is generated as JSON configuration for the ECharts library and
//! rendered with its HTML container and an inline initialization script, so
//! it also works when the dashboard content is swapped in by htmx.

use charming::{
    Chart,
    component::{Axis, Grid, Title, VisualMap, VisualMapPiece},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::transaction::TrendPoint;

/// The CDN build of ECharts, loaded once by the dashboard page.
pub(super) const ECHARTS_SRC: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the chart container followed by the script that draws into it.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div
                id=(chart.id)
                class="min-h-[320px] rounded bg-white dark:bg-gray-100"
            {}

            script { (chart_script(chart)) }
        }
    )
}

fn chart_script(chart: &DashboardChart) -> PreEscaped<String> {
    PreEscaped(format!(
        r#"(function() {{
            const chartDom = document.getElementById("{}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', () => chart.resize());

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
            }};
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        chart.id, chart.options
    ))
}

/// Bar chart of the most recent transactions, oldest on the left.
pub(super) fn trend_chart(trend: &[TrendPoint]) -> Chart {
    let labels: Vec<String> = trend
        .iter()
        .map(|point| point.short_label.clone())
        .collect();
    let values: Vec<f64> = trend.iter().map(|point| point.amount).collect();
    let subtext = match trend.len() {
        1 => "Last transaction".to_owned(),
        count => format!("Last {count} transactions"),
    };

    Chart::new()
        .title(
            Title::new()
                .text("Recent trend")
                .subtext(subtext),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .visual_map(VisualMap::new().show(false).pieces(vec![
            VisualMapPiece::new().lt(0).color("#dc2626"),
            VisualMapPiece::new().gte(0).color("#16a34a"),
        ]))
        .series(Bar::new().name("Amount").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('zh-CN', {
              style: 'currency',
              currency: 'CNY'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
