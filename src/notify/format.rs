//! HTML rendering of alerts for Telegram.

use super::{Alert, AlertLine, SettingsAck, StatusReport};

/// Callback payload carried by the inline status button.
pub const STATUS_CALLBACK: &str = "/status";

/// Inline keyboard button attached under a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub callback_data: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub button: Option<Button>,
}

pub fn render(alert: &Alert) -> RenderedMessage {
    match alert {
        Alert::Opportunities(lines) => RenderedMessage {
            text: render_opportunities(lines),
            button: Some(Button {
                label: "📊 Check Status",
                callback_data: STATUS_CALLBACK,
            }),
        },
        Alert::Status(report) => RenderedMessage {
            text: render_status(report),
            button: Some(Button {
                label: "🔄 Refresh",
                callback_data: STATUS_CALLBACK,
            }),
        },
        Alert::Settings(ack) => RenderedMessage {
            text: render_settings(ack),
            button: None,
        },
        Alert::Test => RenderedMessage {
            text: "🟢 <b>System Test</b>\n\nNotification channel is working.".to_string(),
            button: None,
        },
    }
}

fn render_opportunities(lines: &[AlertLine]) -> String {
    let body: Vec<String> = lines.iter().map(render_line).collect();
    format!("🚨 <b>High Yield Alert</b>\n\n{}", body.join("\n"))
}

fn render_line(line: &AlertLine) -> String {
    let mut out = format!(
        "🚀 <b>{}</b> on {}\n💰 APR: <b>{:.2}%</b>\n📉 Price: ${}\n",
        escape_html(&line.symbol),
        escape_html(&line.venue),
        line.apr,
        format_price(line.price),
    );
    if let Some(net) = line.net_spread {
        out.push_str(&format!("📊 Net Spread: <b>{net:.2}%</b>\n"));
    }
    if let Some(spread) = line.price_spread {
        out.push_str(&format!("↔️ Price Spread: ${}\n", format_price(spread)));
    }
    out
}

fn render_status(report: &StatusReport) -> String {
    let title = if report.manual {
        "🟢 <b>System Status Report</b>"
    } else {
        "💓 <b>Hourly Heartbeat</b>"
    };
    let top_symbol = report
        .top_symbol
        .as_deref()
        .map_or_else(|| "None".to_string(), escape_html);
    format!(
        "{title}\n\n✅ Monitoring Active\n📊 Scanned Pairs: {}\n🏆 Top Opp: {} ({:.2}%)\n\n<i>System is running normally.</i>",
        report.pair_count,
        top_symbol,
        report.top_apr.unwrap_or(0.0),
    )
}

fn render_settings(ack: &SettingsAck) -> String {
    let mut out = format!(
        "⚙️ <b>Watch Settings</b>\n\nMin APR: {:.2}%\nHeartbeat: {}",
        ack.min_spread_apr,
        if ack.heartbeat { "on" } else { "off" },
    );
    if !ack.accepted {
        out.push_str("\n\n<i>Invalid value ignored.</i>");
    }
    out
}

/// Two decimals, widening up to eight for sub-unit prices.
pub fn format_price(value: f64) -> String {
    if value.abs() >= 1.0 || value == 0.0 {
        return with_thousands(&format!("{value:.2}"));
    }
    let fixed = format!("{value:.8}");
    let trimmed = fixed.trim_end_matches('0');
    let decimals = trimmed.split_once('.').map_or(0, |(_, frac)| frac.len());
    if decimals < 2 {
        format!("{value:.2}")
    } else {
        trimmed.to_string()
    }
}

fn with_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

pub fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
