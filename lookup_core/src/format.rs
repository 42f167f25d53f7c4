//! Message rendering for chat surfaces and terminals.
//!
//! Every function here is pure: the same report and markup always give the
//! same text. Missing numbers render as `Unknown`, never as zero.

use crate::chain::Chain;
use crate::chart_health::ChartHealth;
use crate::outcome::{CoinSnapshot, LookupOutcome, LookupReport, TickerOutcome};
use crate::quote::{TokenQuote, UNKNOWN};
use crate::risk::RiskAnnotation;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    #[default]
    Markdown,
    Html,
    Plain,
}

impl FromStr for Markup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(Markup::Markdown),
            "html" => Ok(Markup::Html),
            "plain" | "text" => Ok(Markup::Plain),
            other => Err(format!("Unknown markup '{}'", other)),
        }
    }
}

impl Markup {
    /// Escape user or upstream text for this markup
    pub fn text(&self, s: &str) -> String {
        match self {
            Markup::Html => escape_html(s),
            Markup::Markdown => escape_markdown(s),
            Markup::Plain => s.to_string(),
        }
    }

    fn bold(&self, s: &str) -> String {
        match self {
            Markup::Markdown => format!("*{}*", escape_markdown(s)),
            Markup::Html => format!("<b>{}</b>", escape_html(s)),
            Markup::Plain => s.to_string(),
        }
    }

    fn code(&self, s: &str) -> String {
        match self {
            // Code spans cannot escape a backtick
            Markup::Markdown => format!("`{}`", s.replace('`', "'")),
            Markup::Html => format!("<code>{}</code>", escape_html(s)),
            Markup::Plain => s.to_string(),
        }
    }

    /// Hyperlink for http(s) URLs; anything else renders as the bare label
    fn link(&self, label: &str, url: &str) -> String {
        let Some(url) = web_url(url) else {
            return self.text(label);
        };
        match self {
            Markup::Markdown => format!(
                "[{}]({})",
                escape_markdown(label),
                url.replace(' ', "%20").replace(')', "%29")
            ),
            Markup::Html => format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(label)),
            Markup::Plain => format!("{}: {}", label, url),
        }
    }
}

fn web_url(url: &str) -> Option<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let scheme_ok = lower.starts_with("https://") || lower.starts_with("http://");
    (scheme_ok && !url.contains(char::is_whitespace)).then_some(url)
}

/// Escape for HTML text and double- or single-quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Backslash-escape the Telegram Markdown control characters
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const FLAVOR_LINES: &[&str] = &[
    "🐸 Liquidity is truth; volume is voice.",
    "🐸 Plan the trade, then trade the plan.",
    "🐸 FOMO is expensive tuition.",
    "🐸 If you can't explain it, don't ape it.",
    "🐸 One good exit beats ten almost-moons.",
    "🐸 Protect principal, harvest momentum.",
    "🐸 Red days write the best entries.",
    "🐸 Edge favors patience and exits.",
];

/// Stable pick from the flavor list keyed by the contract address
pub fn flavor_line(address: &str) -> &'static str {
    let hash = address
        .to_lowercase()
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    FLAVOR_LINES[(hash % FLAVOR_LINES.len() as u64) as usize]
}

/// Insert thousands separators into a run of ASCII digits
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Group the integer part of an already formatted decimal string
fn group_decimal(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group_digits(int), frac),
        None => group_digits(formatted),
    }
}

/// `$1.234567`; sub-cent prices keep up to 10 decimals with trailing zeros trimmed
pub fn format_price(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return UNKNOWN.to_string();
    };
    let sign = if v < 0.0 { "-" } else { "" };
    let abs = v.abs();

    let body = if abs >= 0.01 || abs == 0.0 {
        group_decimal(&format!("{:.6}", abs))
    } else {
        let raw = format!("{:.10}", abs);
        let trimmed = raw.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "0" {
            // Below display precision
            format!("{:.2e}", abs)
        } else {
            trimmed.to_string()
        }
    };
    format!("{}${}", sign, body)
}

/// `$12,345` at or above one thousand, otherwise two decimals
pub fn format_money(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return UNKNOWN.to_string();
    };
    let sign = if v < 0.0 { "-" } else { "" };
    // Round before picking the branch so 999.996 lands on "$1,000"
    let cents = (v.abs() * 100.0).round() / 100.0;
    if cents >= 1000.0 {
        format!("{}${}", sign, group_digits(&format!("{:.0}", cents)))
    } else {
        format!("{}${:.2}", sign, cents)
    }
}

pub fn format_pct(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:+.2}%", v),
        None => UNKNOWN.to_string(),
    }
}

fn quote_lines(quote: &TokenQuote, report: &LookupReport, markup: Markup) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("🔩 Contract Report: {}", markup.code(&quote.address)));
    lines.push(String::new());
    lines.push(format!(
        "{} on {}",
        markup.bold(&quote.display_name()),
        markup.bold(quote.chain.label())
    ));
    lines.push(format!("💸 Price: {}", markup.code(&format_price(quote.price_usd))));

    let mut volume = format!("📊 24h Volume: {}", markup.code(&format_money(quote.volume_24h_usd)));
    if quote.volume_1h_usd.is_some() {
        volume.push_str(&format!(" | 1h: {}", markup.code(&format_money(quote.volume_1h_usd))));
    }
    lines.push(volume);

    lines.push(format!(
        "💧 Liquidity: {} | LP: {}",
        markup.code(&format_money(quote.liquidity_usd)),
        quote.lp_status.icon()
    ));
    lines.push(format!("📈 FDV: {}", markup.code(&format_money(quote.fdv_usd))));

    if quote.price_change_24h_pct.is_some() {
        lines.push(format!("📉 24h Change: {}", format_pct(quote.price_change_24h_pct)));
    }

    if let Some(holders) = quote.holders {
        let mut line = format!("👥 Holders: {}", group_digits(&holders.to_string()));
        if let Some(top) = quote.top_holder_pct {
            line.push_str(&format!(" | Top: {:.2}%", top));
        }
        lines.push(line);
    }

    if quote.mint_authority.is_some() || quote.freeze_authority.is_some() {
        let mint = if quote.mint_authority == Some(true) { "♥" } else { "♡" };
        let freeze = if quote.freeze_authority == Some(true) { "❄️" } else { "✖" };
        lines.push(format!("🔐 Mint: {} | Freeze: {}", mint, freeze));
    }

    if let Some(age) = quote.age(report.fetched_at) {
        lines.push(format!("⏳ Age: {}", age));
    }

    lines
}

fn risk_lines(risk: &RiskAnnotation, chain: Chain, markup: Markup) -> Vec<String> {
    match risk {
        RiskAnnotation::Assessed(assessment) => vec![
            format!(
                "⚠️ Risk: {}/100 {} ({})",
                assessment.score,
                assessment.label.text(),
                assessment.rule_set
            ),
            format!("   {}", markup.text(&assessment.flag_summary())),
        ],
        RiskAnnotation::NotCovered => {
            vec![format!("⚠️ Risk: no contract scan available on {}", chain.label())]
        }
        RiskAnnotation::Unavailable(_) => vec!["⚠️ Risk: risk data not available".to_string()],
        RiskAnnotation::Disabled => Vec::new(),
    }
}

fn health_lines(health: &ChartHealth, markup: Markup) -> Vec<String> {
    let mut lines = vec![format!(
        "🩺 {} {}/100 {}",
        markup.bold("Chart Health:"),
        health.score,
        health.status.icon()
    )];
    for c in &health.components {
        lines.push(format!("• {}: {}/{}", c.name, c.points, c.max_points));
    }
    lines.push(markup.text(health.status.remark()));
    lines
}

fn link_line(quote: &TokenQuote, markup: Markup) -> Option<String> {
    if quote.links.is_empty() {
        return None;
    }
    let parts: Vec<String> = [
        ("X", &quote.links.x),
        ("TG", &quote.links.telegram),
        ("WEB", &quote.links.website),
    ]
    .iter()
    .filter_map(|(label, url)| url.as_ref().map(|u| markup.link(label, u)))
    .collect();
    Some(format!("🔗 {}", parts.join(" • ")))
}

/// Full message for a found token
pub fn render_report(report: &LookupReport, markup: Markup) -> String {
    let quote = &report.quote;
    let mut lines = quote_lines(quote, report, markup);

    let risk = risk_lines(&report.risk, quote.chain, markup);
    if !risk.is_empty() {
        lines.push(String::new());
        lines.extend(risk);
    }

    lines.push(String::new());
    lines.extend(health_lines(&report.chart_health, markup));

    if let Some(links) = link_line(quote, markup) {
        lines.push(String::new());
        lines.push(links);
    }

    lines.push(String::new());
    match &quote.note {
        Some(note) => lines.push(markup.text(note)),
        None => lines.push(markup.text(flavor_line(&quote.address))),
    }

    lines.push(String::new());
    lines.push(format!("Source: {}", markup.link(quote.source.name(), &quote.source_url)));

    lines.join("\n")
}

pub fn supported_chains_text() -> String {
    Chain::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_outcome(outcome: &LookupOutcome, markup: Markup) -> String {
    match outcome {
        LookupOutcome::Found(report) => render_report(report, markup),
        LookupOutcome::NotFound {
            chain,
            address,
            manual_check_url,
        } => format!(
            "⛔ Uh oh! CA not found. ⛔\nCan't locate {} on {} 🤔\n\n💡 Check it here: {}",
            markup.code(address),
            chain.as_str().to_uppercase(),
            markup.text(manual_check_url)
        ),
        LookupOutcome::UnsupportedChain { input } => format!(
            "❌ Unsupported chain {}. Supported chains: {}.",
            markup.code(input),
            supported_chains_text()
        ),
        LookupOutcome::InvalidAddress { input } => format!(
            "❌ Invalid contract format: {}. Double-check the address and try again.",
            markup.code(input)
        ),
        LookupOutcome::RateLimited { provider } => format!(
            "⏳ {} is rate limiting requests right now. Please try again later.",
            markup.text(provider)
        ),
        LookupOutcome::UpstreamError { provider, message } => format!(
            "⚠️ Sorry, couldn't fetch data from {}: {}",
            markup.text(provider),
            markup.text(message)
        ),
    }
}

pub fn render_coin(coin: &CoinSnapshot, markup: Markup) -> String {
    let title = if coin.symbol.is_empty() {
        format!("Crypto Update for {}", coin.name)
    } else {
        format!("Crypto Update for {} ({})", coin.name, coin.symbol.to_uppercase())
    };

    let mut trend = coin.trend_7d().as_str().to_string();
    if coin.change_7d_pct.is_some() {
        trend.push_str(&format!(" ({})", format_pct(coin.change_7d_pct)));
    }

    [
        markup.bold(&title),
        format!("- Price: {}", format_price(coin.price_usd)),
        format!("- Market Cap: {}", format_money(coin.market_cap_usd)),
        format!("- Volume (24h): {}", format_money(coin.volume_24h_usd)),
        format!("- 24h Change: {}", format_pct(coin.change_24h_pct)),
        format!("- 7d Trend: {}", trend),
    ]
    .join("\n")
}

pub fn render_ticker_outcome(outcome: &TickerOutcome, markup: Markup) -> String {
    match outcome {
        TickerOutcome::Found(coin) => render_coin(coin, markup),
        TickerOutcome::NotFound { ticker } => format!(
            "Crypto data not found for {}. Ensure the ticker is correct (e.g. ETH).",
            markup.bold(ticker)
        ),
        TickerOutcome::RateLimited { provider } => format!(
            "⏳ {} rate limit exceeded. Please try again later.",
            markup.text(provider)
        ),
        TickerOutcome::UpstreamError { provider, message } => format!(
            "⚠️ Sorry, couldn't fetch data from {}: {}",
            markup.text(provider),
            markup.text(message)
        ),
    }
}
