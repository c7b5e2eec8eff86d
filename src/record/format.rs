//! Text projection of a record
//!
//! Columns are tab separated in the order
//! `CHROM POS ID REF ALT QUAL FILTER INFO [FORMAT sample...]`. Vector elements
//! are joined with `,`, INFO pairs and FILTER names with `;`, FORMAT keys and
//! per-sample values with `:`. Missing values and empty columns print as `.`.

use super::field::Value;
use super::genotype::write_genotype;
use super::record::{is_genotype, VariantRecord};
use crate::codec::{is_missing_float, MISSING_INT};
use crate::error::{RecordError, Result};
use crate::header::{Category, KeyDictionary};

/// Renders a record as one text line without the trailing newline
pub fn format_record(dict: &KeyDictionary, record: &VariantRecord) -> Result<String> {
    let mut out = String::with_capacity(2 * record.size());
    write_record(dict, record, &mut out)?;
    Ok(out)
}

/// Appends the text line of a record to `out`
pub fn write_record(dict: &KeyDictionary, record: &VariantRecord, out: &mut String) -> Result<()> {
    let mut itoa = itoa::Buffer::new();

    let chrom = record
        .contig(dict)
        .ok_or_else(|| RecordError::UnknownKey {
            category: Category::Contig,
            key: record.rid() as i64,
            offset: 4,
        })?;
    out.push_str(chrom);
    out.push('\t');
    out.push_str(itoa.format(i64::from(record.pos()) + 1));
    out.push('\t');
    push_or_missing(out, record.id()?);
    out.push('\t');
    push_or_missing(out, record.reference()?);
    out.push('\t');

    let alts = record.alts()?;
    if alts.is_empty() {
        out.push('.');
    }
    for (i, alt) in alts.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(alt);
    }
    out.push('\t');

    match record.qual() {
        Some(q) => out.push_str(&q.to_string()),
        None => out.push('.'),
    }
    out.push('\t');

    let filters = record.filters()?;
    if filters.is_empty() {
        out.push('.');
    }
    for (i, &id) in filters.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(dict.resolve(id)?.key());
    }
    out.push('\t');

    let info = record.info_fields()?;
    if info.is_empty() {
        out.push('.');
    }
    for (i, field) in info.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(dict.resolve(field.key())?.key());
        let value = field.value()?;
        if value != Value::Flag {
            out.push('=');
            write_value(out, &value);
        }
    }

    if dict.n_sample() == 0 {
        return Ok(());
    }
    out.push('\t');
    let fields = record.format_fields()?;
    if fields.is_empty() {
        out.push('.');
    }
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(dict.resolve(field.key())?.key());
    }

    for sid in 0..dict.n_sample() {
        out.push('\t');
        if fields.is_empty() {
            out.push('.');
        }
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            if is_genotype(dict, field.key(), Category::Format) {
                write_genotype(out, &field.ints(sid)?.unwrap_or_default());
                continue;
            }
            match field.value(sid)? {
                Some(value) => write_value(out, &trim_padding(value)),
                None => out.push('.'),
            }
        }
    }
    Ok(())
}

fn push_or_missing(out: &mut String, s: &str) {
    if s.is_empty() {
        out.push('.');
    } else {
        out.push_str(s);
    }
}

/// Drops the trailing missing elements that pad a sample to the record width
fn trim_padding(value: Value) -> Value {
    match value {
        Value::Int(mut v) => {
            let end = v.iter().rposition(|&x| x != MISSING_INT).map_or(0, |i| i + 1);
            v.truncate(end);
            Value::Int(v)
        }
        Value::Float(mut v) => {
            let end = v.iter().rposition(|&x| !is_missing_float(x)).map_or(0, |i| i + 1);
            v.truncate(end);
            Value::Float(v)
        }
        other => other,
    }
}

fn write_value(out: &mut String, value: &Value) {
    let mut itoa = itoa::Buffer::new();
    match value {
        Value::Flag => {}
        Value::Int(v) if v.is_empty() => out.push('.'),
        Value::Float(v) if v.is_empty() => out.push('.'),
        Value::Int(v) => {
            for (i, &x) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if x == MISSING_INT {
                    out.push('.');
                } else {
                    out.push_str(itoa.format(x));
                }
            }
        }
        Value::Float(v) => {
            for (i, &x) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if is_missing_float(x) {
                    out.push('.');
                } else {
                    out.push_str(&x.to_string());
                }
            }
        }
        Value::Str(s) => push_or_missing(out, s),
    }
}
