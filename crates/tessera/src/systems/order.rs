use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::components::{OrderType, PriceTable, Variant};
use crate::grid::{CompositionGrid, VariantCounts};
use crate::systems::pricing::{format_amount, OrderSummary};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderField {
    Name,
    Address,
    PostalCode,
    Country,
    Phone,
    Email,
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderField::Name => "name",
            OrderField::Address => "address",
            OrderField::PostalCode => "postal code",
            OrderField::Country => "country",
            OrderField::Phone => "phone",
            OrderField::Email => "email",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("order form incomplete: missing {}", join_fields(.0))]
    MissingFields(Vec<OrderField>),
}

fn join_fields(fields: &[OrderField]) -> String {
    fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
}

/// Contact details collected by the order dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

impl OrderForm {
    fn fields(&self) -> [(OrderField, &str); 6] {
        [
            (OrderField::Name, &self.name),
            (OrderField::Address, &self.address),
            (OrderField::PostalCode, &self.postal_code),
            (OrderField::Country, &self.country),
            (OrderField::Phone, &self.phone),
            (OrderField::Email, &self.email),
        ]
    }

    /// Fields that are empty or whitespace-only, in form order.
    pub fn missing_fields(&self) -> Vec<OrderField> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// What the order button should do for the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderGate {
    /// Every cell is filled; open the order dialog.
    Proceed,
    /// Some cells are empty; ask before ordering anyway.
    ConfirmEmptyCells(usize),
}

pub fn order_gate(grid: &CompositionGrid) -> OrderGate {
    if grid.has_empty_cell() {
        OrderGate::ConfirmEmptyCells(grid.empty_count())
    } else {
        OrderGate::Proceed
    }
}

/// Calendar date stamped into composition titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDate {
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

impl OrderDate {
    pub fn new(day: u32, month: u32, year: u32) -> Self {
        OrderDate { day, month, year }
    }

    /// `DD MM YYYY`, the Croatian locale date with its dots dropped.
    pub fn stamp(&self) -> String {
        format!("{:02} {:02} {:04}", self.day, self.month, self.year)
    }

    /// Local date from the browser clock.
    #[cfg(target_arch = "wasm32")]
    pub fn today() -> Self {
        let now = js_sys::Date::new_0();
        OrderDate {
            day: now.get_date(),
            month: now.get_month() + 1,
            year: now.get_full_year(),
        }
    }
}

/// Name used for the mail subject and the exported picture.
pub fn composition_title(counts: &VariantCounts, date: &OrderDate) -> String {
    format!(
        "Kompozicija S0{} S1{} S2{} {}",
        counts.get(Variant::S0),
        counts.get(Variant::S1),
        counts.get(Variant::S2),
        date.stamp()
    )
}

/// Line-by-line order text for the mail draft.
pub fn mail_body(form: &OrderForm, summary: &OrderSummary, prices: &PriceTable, order_type: OrderType) -> String {
    let mut lines = vec![
        format!("Ime i prezime: {}", form.name),
        format!("Ulica stanovanja: {}", form.address),
        format!("Poštanski broj i grad: {}", form.postal_code),
        format!("Država: {}", form.country),
        format!("Telefon: {}", form.phone),
        format!("E-mail: {}", form.email),
        "Narudžba:".to_string(),
    ];
    for variant in Variant::ALL {
        lines.push(format!(
            "{}: {} x {}€ = {}€",
            variant.label(),
            summary.counts.get(variant),
            prices.price(variant),
            summary.line_total(variant)
        ));
    }
    if order_type == OrderType::Magnetic {
        lines.push(format!("čičak dodatak: {}€", summary.surcharge));
    }
    lines.push(format!("Dimenzije: {}", summary.dimensions.label()));
    lines.push(format!("Ukupno: {}€", format_amount(summary.total)));
    lines.join("\n")
}

/// Percent-encode the way `encodeURIComponent` does.
pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

pub fn mailto_url(address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        address,
        encode_uri_component(subject),
        encode_uri_component(body)
    )
}

/// A ready-to-open mail draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub subject: String,
    pub body: String,
    pub mailto: String,
}

/// Validate the form and build the mail draft for the current summary.
pub fn draft_order(
    form: &OrderForm,
    summary: &OrderSummary,
    prices: &PriceTable,
    order_type: OrderType,
    date: &OrderDate,
    address: &str,
) -> Result<OrderDraft, OrderError> {
    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(OrderError::MissingFields(missing));
    }
    let subject = composition_title(&summary.counts, date);
    let body = mail_body(form, summary, prices, order_type);
    let mailto = mailto_url(address, &subject, &body);
    Ok(OrderDraft { subject, body, mailto })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComposerConfig, Rotation};
    use crate::grid::TileFace;
    use crate::systems::pricing::summarize;

    fn full_form() -> OrderForm {
        OrderForm {
            name: "Ana Horvat".into(),
            address: "Ilica 1".into(),
            postal_code: "10000 Zagreb".into(),
            country: "Hrvatska".into(),
            phone: "+385 1 234".into(),
            email: "ana@example.com".into(),
        }
    }

    fn sample_summary(order_type: OrderType) -> OrderSummary {
        let mut grid = CompositionGrid::new(3, 2).unwrap();
        for (variant, n) in [(Variant::S0, 2), (Variant::S1, 3), (Variant::S2, 1)] {
            for _ in 0..n {
                grid.place_first_empty(TileFace::new(variant, Rotation::Deg0));
            }
        }
        summarize(&grid, &ComposerConfig::default(), order_type)
    }

    #[test]
    fn blank_fields_are_reported_in_order() {
        let mut form = full_form();
        form.address = "   ".into();
        form.email.clear();
        assert_eq!(form.missing_fields(), vec![OrderField::Address, OrderField::Email]);
        assert!(!form.is_complete());
        assert!(full_form().is_complete());
    }

    #[test]
    fn title_lists_counts_and_date() {
        let summary = sample_summary(OrderType::Regular);
        let title = composition_title(&summary.counts, &OrderDate::new(7, 3, 2025));
        assert_eq!(title, "Kompozicija S02 S13 S21 07 03 2025");
    }

    #[test]
    fn body_lists_lines_and_total() {
        let summary = sample_summary(OrderType::Regular);
        let body = mail_body(&full_form(), &summary, &PriceTable::default(), OrderType::Regular);
        assert!(body.contains("S0: 2 x 7€ = 14€"));
        assert!(body.contains("S1: 3 x 12€ = 36€"));
        assert!(body.contains("S2: 1 x 12€ = 12€"));
        assert!(body.contains("Dimenzije: 45 x 30 cm"));
        assert!(body.ends_with("Ukupno: 62.00€"));
        assert!(!body.contains("čičak"));
    }

    #[test]
    fn magnetic_body_has_surcharge_line() {
        let summary = sample_summary(OrderType::Magnetic);
        let body = mail_body(&full_form(), &summary, &PriceTable::default(), OrderType::Magnetic);
        assert!(body.contains("čičak dodatak: 18€"));
        assert!(body.ends_with("Ukupno: 80.00€"));
    }

    #[test]
    fn encoding_matches_encode_uri_component() {
        assert_eq!(encode_uri_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_uri_component("(ok)!*~'-_."), "(ok)!*~'-_.");
        assert_eq!(encode_uri_component("7€"), "7%E2%82%AC");
        assert_eq!(encode_uri_component("x\ny"), "x%0Ay");
    }

    #[test]
    fn incomplete_form_blocks_draft() {
        let summary = sample_summary(OrderType::Regular);
        let mut form = full_form();
        form.phone.clear();
        let err = draft_order(&form, &summary, &PriceTable::default(), OrderType::Regular, &OrderDate::new(1, 1, 2025), "x@y.z")
            .unwrap_err();
        assert_eq!(err, OrderError::MissingFields(vec![OrderField::Phone]));
        assert_eq!(err.to_string(), "order form incomplete: missing phone");
    }

    #[test]
    fn draft_has_encoded_mailto() {
        let summary = sample_summary(OrderType::Regular);
        let draft = draft_order(&full_form(), &summary, &PriceTable::default(), OrderType::Regular, &OrderDate::new(1, 12, 2025), "orders@example.com")
            .unwrap();
        assert_eq!(draft.subject, "Kompozicija S02 S13 S21 01 12 2025");
        assert!(draft.mailto.starts_with("mailto:orders@example.com?subject=Kompozicija%20S02%20S13%20S21%2001%2012%202025&body="));
        assert!(!draft.mailto.contains(' '));
    }

    #[test]
    fn gate_requires_full_grid() {
        let mut grid = CompositionGrid::new(2, 1).unwrap();
        assert_eq!(order_gate(&grid), OrderGate::ConfirmEmptyCells(2));
        grid.place_first_empty(TileFace::new(Variant::S0, Rotation::Deg0));
        assert_eq!(order_gate(&grid), OrderGate::ConfirmEmptyCells(1));
        grid.place_first_empty(TileFace::new(Variant::S0, Rotation::Deg0));
        assert_eq!(order_gate(&grid), OrderGate::Proceed);
    }
}
