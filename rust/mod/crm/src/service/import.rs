//! Customer import from spreadsheet exports.
//!
//! Files come from whatever tool the marketing team used that week, so the
//! header row, delimiter, phone format and date format are all guessed.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use clinic_core::{today, transaction, Principal, Role, ServiceError};
use clinic_sql::Executor;

use crate::model::{CreateCustomer, Gender, ImportReport, SkippedRow, Source};
use crate::service::customers::scope_filter;
use crate::service::CrmService;

/// Customer fields a column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Phone,
    Email,
    Gender,
    BirthDate,
    Address,
    Source,
    Note,
}

/// Match order. More specific fields claim their column before `Name`,
/// whose aliases ("customer", "ten") also appear inside other headers.
const MATCH_ORDER: [Field; 8] = [
    Field::Phone,
    Field::Email,
    Field::BirthDate,
    Field::Gender,
    Field::Source,
    Field::Note,
    Field::Address,
    Field::Name,
];

impl Field {
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Name => &[
                "name", "full name", "fullname", "customer name", "customer", "client",
                "họ tên", "ho ten", "họ và tên", "ho va ten", "tên", "ten",
                "tên khách hàng", "ten khach hang", "khách hàng", "khach hang",
            ],
            Field::Phone => &[
                "phone", "phone number", "mobile", "tel", "telephone", "cell",
                "sđt", "sdt", "số điện thoại", "so dien thoai", "điện thoại", "dien thoai",
                "di động", "di dong",
            ],
            Field::Email => &["email", "e mail", "mail", "thư điện tử", "thu dien tu"],
            Field::Gender => &["gender", "sex", "giới tính", "gioi tinh", "phái", "phai"],
            Field::BirthDate => &[
                "birth date", "birthdate", "birthday", "date of birth", "dob",
                "ngày sinh", "ngay sinh", "sinh nhật", "sinh nhat", "năm sinh", "nam sinh",
            ],
            Field::Address => &["address", "addr", "địa chỉ", "dia chi", "tỉnh thành", "tinh thanh"],
            Field::Source => &[
                "source", "lead source", "channel", "nguồn", "nguon", "kênh", "kenh",
                "nguồn khách", "nguon khach",
            ],
            Field::Note => &[
                "note", "notes", "comment", "comments", "remark", "remarks",
                "ghi chú", "ghi chu", "mô tả", "mo ta",
            ],
        }
    }
}

/// Lower-case, trim, turn `_ - .` into spaces and collapse runs of spaces.
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '_' | '-' | '.') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Map header cells to fields. Exact alias matches win over containment.
pub fn map_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<HashMap<Field, usize>, ServiceError> {
    let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();
    let mut mapping: HashMap<Field, usize> = HashMap::new();
    let mut taken = vec![false; normalized.len()];

    let passes: [fn(&str, &str) -> bool; 2] = [|h, a| h == a, contains_words];
    for matches in passes {
        for field in MATCH_ORDER {
            if mapping.contains_key(&field) {
                continue;
            }
            let hit = normalized.iter().enumerate().find(|(i, h)| {
                !taken[*i] && field.aliases().iter().any(|a| matches(h.as_str(), a))
            });
            if let Some((i, _)) = hit {
                taken[i] = true;
                mapping.insert(field, i);
            }
        }
    }

    for required in [Field::Name, Field::Phone] {
        if !mapping.contains_key(&required) {
            return Err(ServiceError::Validation(format!(
                "no {} column found in header",
                if required == Field::Name { "name" } else { "phone" }
            )));
        }
    }
    Ok(mapping)
}

/// Most frequent of `,` `;` tab in the header line. Comma on ties.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let count = |c: char| header_line.chars().filter(|&x| x == c).count();
    let mut best = (b',', count(','));
    for (byte, c) in [(b';', ';'), (b'\t', '\t')] {
        let n = count(c);
        if n > best.1 {
            best = (byte, n);
        }
    }
    best.0
}

/// Normalise a Vietnamese phone number to its national form.
///
/// Keeps digits only; `84xxxxxxxxx` becomes `0xxxxxxxxx`; nine digits
/// without a leading zero (dropped by spreadsheets) get it back. The result
/// must be 10 or 11 digits starting with `0`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let national = if digits.len() == 11 && digits.starts_with("84") {
        format!("0{}", &digits[2..])
    } else if digits.len() == 9 && !digits.starts_with('0') {
        format!("0{digits}")
    } else {
        digits
    };
    (national.starts_with('0') && (10..=11).contains(&national.len())).then_some(national)
}

/// Spreadsheet serial day zero.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Parse the date formats seen in real exports.
///
/// Day-first is preferred; month-first is only tried when day-first is
/// impossible. Two-digit years land in the past century when the current
/// one would put them in the future.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    // "2024-05-01 00:00:00" and friends.
    let s = raw.split_whitespace().next()?;

    if let Ok(serial) = s.parse::<f64>() {
        if !s.contains(['-', '/']) && (1.0..=100_000.0).contains(&serial) {
            return serial_epoch()?.checked_add_days(chrono::Days::new(serial.trunc() as u64));
        }
    }

    let parts: Vec<&str> = s.split(['-', '/', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let num = |p: &str| p.parse::<u32>().ok();
    let (a, b, c) = (num(parts[0])?, num(parts[1])?, num(parts[2])?);

    match (parts[0].len(), parts[2].len()) {
        (4, 1..=2) => NaiveDate::from_ymd_opt(a as i32, b, c),
        (1..=2, 4) => NaiveDate::from_ymd_opt(c as i32, b, a)
            .or_else(|| s.contains('/').then(|| NaiveDate::from_ymd_opt(c as i32, a, b)).flatten()),
        (1..=2, 2) if s.contains('/') => {
            let this_year = today().year();
            let mut year = 2000 + c as i32;
            if year > this_year {
                year -= 100;
            }
            NaiveDate::from_ymd_opt(year, b, a)
        }
        _ => None,
    }
}

pub fn parse_gender(raw: &str) -> Option<Gender> {
    match raw.trim().to_lowercase().as_str() {
        "nam" | "male" | "m" => Some(Gender::Male),
        "nữ" | "nu" | "female" | "f" => Some(Gender::Female),
        _ => None,
    }
}

/// Map a free-text channel name onto [`Source`].
pub fn parse_source(raw: &str) -> Source {
    const WORDS: &[(&str, Source)] = &[
        ("facebook", Source::Facebook),
        ("fb", Source::Facebook),
        ("face book", Source::Facebook),
        ("messenger", Source::Facebook),
        ("zalo", Source::Zalo),
        ("tiktok", Source::TikTok),
        ("tik tok", Source::TikTok),
        ("google", Source::Google),
        ("gg", Source::Google),
        ("adwords", Source::Google),
        ("website", Source::Website),
        ("web", Source::Website),
        ("landing page", Source::Website),
        ("referral", Source::Referral),
        ("giới thiệu", Source::Referral),
        ("gioi thieu", Source::Referral),
        ("người quen", Source::Referral),
        ("nguoi quen", Source::Referral),
        ("walk in", Source::WalkIn),
        ("walkin", Source::WalkIn),
        ("vãng lai", Source::WalkIn),
        ("vang lai", Source::WalkIn),
        ("tại quầy", Source::WalkIn),
        ("tai quay", Source::WalkIn),
    ];
    let text = normalize_header(raw);
    if let Some(source) = Source::from_str(&text.to_uppercase().replace(' ', "_")) {
        return source;
    }
    WORDS
        .iter()
        .find(|(word, _)| contains_words(&text, word))
        .map(|(_, source)| *source)
        .unwrap_or(Source::Other)
}

impl CrmService {
    /// Import customers from CSV text.
    ///
    /// Rows are independent: a bad row is reported and skipped. Only a
    /// header without name or phone columns fails the whole import.
    pub fn import_customers(&self, caller: &Principal, csv_text: &str) -> Result<ImportReport, ServiceError> {
        scope_filter(caller)?;
        caller.require(&[Role::Manager, Role::Telesale, Role::Marketing, Role::Receptionist])?;

        let text = csv_text.strip_prefix('\u{feff}').unwrap_or(csv_text);
        let header_line = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| ServiceError::Validation("the file is empty".into()))?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(header_line))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| ServiceError::Validation(format!("unreadable header: {e}")))?
            .clone();
        let columns = map_headers(headers.iter())?;
        let pool = self.lead_pool(caller)?;

        let mut report = ImportReport::default();
        transaction(self.sql.as_ref(), |tx| {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for (i, record) in reader.records().enumerate() {
                let row = i + 1;
                report.total_rows += 1;
                let outcome = record
                    .map_err(|e| ServiceError::Validation(format!("unreadable row: {e}")))
                    .and_then(|record| self.import_row(tx, caller, &columns, &record, row, &mut seen, pool.as_deref()));
                match outcome {
                    Ok(()) => report.imported += 1,
                    Err(ServiceError::Validation(reason)) | Err(ServiceError::Conflict(reason)) => {
                        warn!(row, "skipped import row: {reason}");
                        report.skipped.push(SkippedRow { row, reason });
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })?;

        info!(
            by = %caller.staff_id,
            total = report.total_rows,
            imported = report.imported,
            skipped = report.skipped.len(),
            "customer import finished"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn import_row(
        &self,
        tx: &dyn Executor,
        caller: &Principal,
        columns: &HashMap<Field, usize>,
        record: &csv::StringRecord,
        row: usize,
        seen: &mut HashMap<String, usize>,
        pool: Option<&[String]>,
    ) -> Result<(), ServiceError> {
        let cell = |field: Field| {
            columns
                .get(&field)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let name = cell(Field::Name).ok_or_else(|| ServiceError::Validation("missing name".into()))?;
        let raw_phone = cell(Field::Phone).ok_or_else(|| ServiceError::Validation("missing phone".into()))?;
        let phone = normalize_phone(raw_phone)
            .ok_or_else(|| ServiceError::Validation(format!("invalid phone '{raw_phone}'")))?;
        if let Some(first) = seen.get(&phone) {
            return Err(ServiceError::Conflict(format!(
                "phone {phone} duplicates row {first}"
            )));
        }

        let birth_date = cell(Field::BirthDate).and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                debug!(row, "dropping unparseable birth date '{raw}'");
            }
            parsed
        });

        let input = CreateCustomer {
            name: name.to_string(),
            phone: phone.clone(),
            email: cell(Field::Email).map(str::to_string),
            gender: cell(Field::Gender).and_then(parse_gender),
            birth_date,
            address: cell(Field::Address).map(str::to_string),
            source: cell(Field::Source).map(parse_source).unwrap_or_default(),
            assigned_to: None,
            note: cell(Field::Note).map(str::to_string),
        };
        self.insert_customer(tx, caller, input, pool)?;
        seen.insert(phone, row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerQuery;
    use crate::service::testing::{admin, service, who};
    use clinic_core::Team;

    #[test]
    fn phone_normalisation() {
        assert_eq!(normalize_phone("0912 345 678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("+84 912-345-678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("84912345678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("912345678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("01234567890").as_deref(), Some("01234567890"));
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("1912345678"), None);
        assert_eq!(normalize_phone(""), None);
    }

    #[test]
    fn date_sniffing() {
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(parse_date("1990-07-15"), d(1990, 7, 15));
        assert_eq!(parse_date("1990/07/15"), d(1990, 7, 15));
        assert_eq!(parse_date("15/07/1990"), d(1990, 7, 15));
        assert_eq!(parse_date("15-07-1990"), d(1990, 7, 15));
        assert_eq!(parse_date("15.07.1990"), d(1990, 7, 15));
        assert_eq!(parse_date("05/07/1990"), d(1990, 7, 5));
        // Month-first only when day-first is impossible.
        assert_eq!(parse_date("07/15/1990"), d(1990, 7, 15));
        assert_eq!(parse_date("15/07/85"), d(1985, 7, 15));
        assert_eq!(parse_date("01/02/03"), d(2003, 2, 1));
        assert_eq!(parse_date("32874"), d(1990, 1, 1));
        assert_eq!(parse_date("1990-07-15 00:00:00"), d(1990, 7, 15));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("31/02/1990"), None);
        assert_eq!(parse_date("0"), None);
    }

    #[test]
    fn header_mapping() {
        let map = map_headers(["Họ và tên", "SĐT", "Ngày_sinh", "Nguồn khách", "Ghi chú"]).unwrap();
        assert_eq!(map[&Field::Name], 0);
        assert_eq!(map[&Field::Phone], 1);
        assert_eq!(map[&Field::BirthDate], 2);
        assert_eq!(map[&Field::Source], 3);
        assert_eq!(map[&Field::Note], 4);

        let map = map_headers(["Customer Phone", "Customer Name", "e-mail"]).unwrap();
        assert_eq!(map[&Field::Phone], 0);
        assert_eq!(map[&Field::Name], 1);
        assert_eq!(map[&Field::Email], 2);

        assert!(matches!(map_headers(["name", "email"]), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn delimiter_sniffing() {
        assert_eq!(sniff_delimiter("name,phone,email"), b',');
        assert_eq!(sniff_delimiter("name;phone;email"), b';');
        assert_eq!(sniff_delimiter("name\tphone"), b'\t');
        assert_eq!(sniff_delimiter("name;phone,email"), b',');
        assert_eq!(sniff_delimiter("name"), b',');
    }

    #[test]
    fn words_to_enums() {
        assert_eq!(parse_gender("Nữ"), Some(Gender::Female));
        assert_eq!(parse_gender("M"), Some(Gender::Male));
        assert_eq!(parse_gender("?"), None);
        assert_eq!(parse_source("FB Ads"), Source::Facebook);
        assert_eq!(parse_source("Giới thiệu"), Source::Referral);
        assert_eq!(parse_source("khách vãng lai"), Source::WalkIn);
        assert_eq!(parse_source("walk_in"), Source::WalkIn);
        assert_eq!(parse_source("billboard"), Source::Other);
    }

    #[test]
    fn import_skips_bad_rows_with_row_numbers() {
        let (svc, _) = service();
        svc.create_customer(
            &admin(),
            crate::model::CreateCustomer {
                name: "Existing".into(),
                phone: "0900000009".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let csv = "\u{feff}Họ tên;Số điện thoại;Ngày sinh;Giới tính;Nguồn\n\
                   Mai;0912345678;15/07/1990;nữ;Facebook\n\
                   ;0912000001;;;\n\
                   Lan;123;;;\n\
                   Hoa;+84912345678;;;\n\
                   Tuan;900000009;;;\n\
                   Nam;0987654321;bad date;nam;vãng lai\n";
        let report = svc.import_customers(&admin(), csv).unwrap();

        assert_eq!(report.total_rows, 6);
        assert_eq!(report.imported, 2);
        let rows: Vec<usize> = report.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![2, 3, 4, 5]);
        assert!(report.skipped[2].reason.contains("duplicates row 1"));

        let all = svc.list_customers(&admin(), &CustomerQuery::default()).unwrap();
        assert_eq!(all.total, 3);
        let nam = all.items.iter().find(|c| c.name == "Nam").unwrap();
        assert_eq!(nam.birth_date, None);
        assert_eq!(nam.source, Source::WalkIn);
        assert_eq!(nam.gender, Some(Gender::Male));
        let mai = all.items.iter().find(|c| c.name == "Mai").unwrap();
        assert_eq!(mai.birth_date, NaiveDate::from_ymd_opt(1990, 7, 15));
    }

    #[test]
    fn team_a_import_spreads_across_team_b() {
        let (svc, roster) = service();
        roster.set(Team::B, &["b1", "b2"]);
        let a = who("a1", Role::Telesale, Some(Team::A));
        let csv = "name,phone\nA,0900000001\nB,0900000002\nC,0900000003\nD,0900000004\n";
        let report = svc.import_customers(&a, csv).unwrap();
        assert_eq!(report.imported, 4);

        let b1 = svc
            .list_customers(&admin(), &CustomerQuery { assigned_to: Some("b1".into()), ..Default::default() })
            .unwrap();
        assert_eq!(b1.total, 2);
    }

    #[test]
    fn missing_phone_column_fails_whole_import() {
        let (svc, _) = service();
        let err = svc.import_customers(&admin(), "name,email\nMai,m@x.vn\n").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
