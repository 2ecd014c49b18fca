use crate::core::calculator::{BULK_DISCOUNT_RATE, ITEM_DISCOUNT_RATE, TAX_RATE};
use crate::core::form::RejectedField;
use crate::core::OrderResult;
use crate::utils::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

impl OutputFormat {
    pub const VARIANTS: [&'static str; 3] = ["text", "html", "json"];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(OrderError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: format!("Valid formats: {}", Self::VARIANTS.join(", ")),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub currency_symbol: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// 一次提交的完整結果：計算結果加上被丟棄的欄位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReceipt {
    pub shop_name: String,
    pub processed_at: DateTime<Utc>,
    pub order: OrderResult,
    pub rejected: Vec<RejectedField>,
}

#[derive(Serialize)]
struct JsonReceipt<'a> {
    shop_name: &'a str,
    processed_at: DateTime<Utc>,
    #[serde(flatten)]
    order: &'a OrderResult,
    total_discounts: Decimal,
    rejected: &'a [RejectedField],
}

/// 四捨五入到兩位小數（遠離零），千分位加逗號，例如 `-$1,234.50`
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    let plain = format!("{:.2}", rounded.abs());

    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!(
        "{}{}{}.{}",
        if negative { "-" } else { "" },
        symbol,
        grouped,
        fraction
    )
}

fn format_discount(amount: Decimal, symbol: &str) -> String {
    if amount > Decimal::ZERO {
        format!("-{}", format_currency(amount, symbol))
    } else {
        format_currency(Decimal::ZERO, symbol)
    }
}

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render(receipt: &OrderReceipt, format: OutputFormat, options: &RenderOptions) -> Result<String> {
    match format {
        OutputFormat::Text => render_text(receipt, options),
        OutputFormat::Html => render_html(receipt, options),
        OutputFormat::Json => render_json(receipt),
    }
}

pub fn render_text(receipt: &OrderReceipt, options: &RenderOptions) -> Result<String> {
    let symbol = options.currency_symbol.as_str();
    let order = &receipt.order;
    let mut out = String::new();

    writeln!(out, "{}", receipt.shop_name)?;
    writeln!(out, "Order Results")?;
    writeln!(
        out,
        "Order processed on: {}",
        receipt.processed_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out)?;

    if order.is_empty() {
        writeln!(out, "No valid items were ordered.")?;
    } else {
        writeln!(out, "Your order is as follows:")?;
        for line in &order.items {
            write!(
                out,
                "  {}: {} x {} = {}",
                line.name,
                line.quantity,
                format_currency(line.price, symbol),
                format_currency(line.line_total, symbol)
            )?;
            if line.has_discount {
                write!(
                    out,
                    " ({} OFF -{})",
                    percent(ITEM_DISCOUNT_RATE),
                    format_currency(line.discount, symbol)
                )?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "{}", "-".repeat(40))?;
    writeln!(
        out,
        "Total Quantity Discounts: {}",
        format_discount(order.item_discounts, symbol)
    )?;
    writeln!(
        out,
        "Subtotal (after item discounts): {}",
        format_currency(order.subtotal, symbol)
    )?;
    writeln!(
        out,
        "Bulk Discount ({}): {}",
        percent(BULK_DISCOUNT_RATE),
        format_discount(order.bulk_discount, symbol)
    )?;
    writeln!(
        out,
        "Tax ({}): {}",
        percent(TAX_RATE),
        format_currency(order.tax, symbol)
    )?;
    writeln!(
        out,
        "Total Discounts: {}",
        format_discount(order.total_discounts(), symbol)
    )?;
    writeln!(out, "Final Total: {}", format_currency(order.final_total, symbol))?;

    if !receipt.rejected.is_empty() {
        writeln!(out)?;
        writeln!(out, "Skipped fields:")?;
        for field in &receipt.rejected {
            writeln!(out, "  {}={:?}: {}", field.key, field.value, field.reason)?;
        }
    }

    Ok(out)
}

pub fn render_html(receipt: &OrderReceipt, options: &RenderOptions) -> Result<String> {
    let symbol = escape_html(&options.currency_symbol);
    let symbol = symbol.as_str();
    let order = &receipt.order;
    let shop_name = escape_html(&receipt.shop_name);
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<title>{} - Order Summary</title>", shop_name)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<div class=\"card\"><div class=\"card-body\">")?;
    writeln!(out, "<h1>{}</h1>", shop_name)?;
    writeln!(out, "<h5 class=\"card-title\">Order Summary</h5>")?;
    writeln!(
        out,
        "<p class=\"text-muted\">Order processed on: {}</p>",
        receipt.processed_at.format("%Y-%m-%d %H:%M:%S")
    )?;

    if order.is_empty() {
        writeln!(out, "<div class=\"alert alert-danger\">No valid items</div>")?;
    } else {
        writeln!(out, "<table class=\"table table-hover\">")?;
        writeln!(
            out,
            "<thead><tr><th>Item</th><th>Price</th><th>Qty</th><th>Subtotal</th><th>Discount</th></tr></thead>"
        )?;
        writeln!(out, "<tbody>")?;
        for line in &order.items {
            write!(out, "<tr><td><strong>{}</strong>", escape_html(&line.name))?;
            if line.has_discount {
                write!(
                    out,
                    " <span class=\"badge bg-success discount-badge\">{} OFF</span>",
                    percent(ITEM_DISCOUNT_RATE)
                )?;
            }
            write!(
                out,
                "</td><td>{}</td><td>{}</td><td>{}</td>",
                format_currency(line.price, symbol),
                line.quantity,
                format_currency(line.subtotal, symbol)
            )?;
            if line.discount > Decimal::ZERO {
                writeln!(
                    out,
                    "<td><span class=\"text-success\">-{}</span></td></tr>",
                    format_currency(line.discount, symbol)
                )?;
            } else {
                writeln!(out, "<td>-</td></tr>")?;
            }
        }
        writeln!(out, "</tbody>")?;
        writeln!(out, "</table>")?;
    }

    writeln!(out, "<div class=\"total-section\">")?;
    writeln!(
        out,
        "<div class=\"row\"><div class=\"col-8\">Item Discounts ({} on {}+ qty):</div><div class=\"col-4 text-end\">-{}</div></div>",
        percent(ITEM_DISCOUNT_RATE),
        crate::core::calculator::ITEM_DISCOUNT_THRESHOLD,
        format_currency(order.item_discounts, symbol)
    )?;
    if order.has_bulk_discount {
        writeln!(
            out,
            "<div class=\"row\"><div class=\"col-8\">Bulk Order Discount ({} on {}+):</div><div class=\"col-4 text-end\">-{}</div></div>",
            percent(BULK_DISCOUNT_RATE),
            format_currency(crate::core::calculator::BULK_DISCOUNT_THRESHOLD, symbol),
            format_currency(order.bulk_discount, symbol)
        )?;
    }
    writeln!(
        out,
        "<div class=\"row\"><div class=\"col-8\">Tax ({}):</div><div class=\"col-4 text-end\">{}</div></div>",
        percent(TAX_RATE),
        format_currency(order.tax, symbol)
    )?;
    writeln!(
        out,
        "<div class=\"row\"><div class=\"col-8\">Total Discounts:</div><div class=\"col-4 text-end\">-{}</div></div>",
        format_currency(order.total_discounts(), symbol)
    )?;
    writeln!(out, "<hr>")?;
    writeln!(
        out,
        "<div class=\"row\"><div class=\"col-8\"><strong>Final Total:</strong></div><div class=\"col-4 text-end\"><strong>{}</strong></div></div>",
        format_currency(order.final_total, symbol)
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "</div></div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;

    Ok(out)
}

pub fn render_json(receipt: &OrderReceipt) -> Result<String> {
    let view = JsonReceipt {
        shop_name: &receipt.shop_name,
        processed_at: receipt.processed_at,
        order: &receipt.order,
        total_discounts: receipt.order.total_discounts(),
        rejected: &receipt.rejected,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}
