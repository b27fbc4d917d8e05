use super::{BareItem, Decimal, Dictionary, InnerList, Item, List, ListEntry, Parameters};
use std::fmt::Write;

pub(super) fn item(item: &Item) -> String {
    let mut output = String::new();
    write_item(&mut output, item);
    output
}

pub(super) fn inner_list(list: &InnerList) -> String {
    let mut output = String::new();
    write_inner_list(&mut output, list);
    output
}

pub(super) fn list(list: &List) -> String {
    let mut output = String::new();
    for (index, entry) in list.0.iter().enumerate() {
        if index > 0 {
            output.push_str(", ");
        }
        write_entry(&mut output, entry);
    }
    output
}

pub(super) fn dictionary(dictionary: &Dictionary) -> String {
    let mut output = String::new();
    for (index, (key, entry)) in dictionary.iter().enumerate() {
        if index > 0 {
            output.push_str(", ");
        }
        output.push_str(key.as_str());

        // A boolean-true item collapses to the bare key with its parameters
        match entry {
            ListEntry::Item(item) if item.bare == BareItem::Boolean(true) => {
                write_parameters(&mut output, &item.params);
            }
            entry => {
                output.push('=');
                write_entry(&mut output, entry);
            }
        }
    }
    output
}

fn write_entry(output: &mut String, entry: &ListEntry) {
    match entry {
        ListEntry::Item(item) => write_item(output, item),
        ListEntry::InnerList(list) => write_inner_list(output, list),
    }
}

fn write_item(output: &mut String, item: &Item) {
    write_bare(output, &item.bare);
    write_parameters(output, &item.params);
}

fn write_inner_list(output: &mut String, list: &InnerList) {
    output.push('(');
    for (index, item) in list.items.iter().enumerate() {
        if index > 0 {
            output.push(' ');
        }
        write_item(output, item);
    }
    output.push(')');
    write_parameters(output, &list.params);
}

fn write_parameters(output: &mut String, params: &Parameters) {
    for (key, value) in params.iter() {
        output.push(';');
        output.push_str(key.as_str());

        if *value != BareItem::Boolean(true) {
            output.push('=');
            write_bare(output, value);
        }
    }
}

fn write_bare(output: &mut String, bare: &BareItem) {
    match bare {
        BareItem::Integer(value) => {
            let _ = write!(output, "{}", value.get());
        }
        BareItem::Decimal(value) => write_decimal(output, *value),
        BareItem::String(value) => {
            output.push('"');
            for ch in value.as_str().chars() {
                if matches!(ch, '"' | '\\') {
                    output.push('\\');
                }
                output.push(ch);
            }
            output.push('"');
        }
        BareItem::Token(value) => output.push_str(value.as_str()),
        BareItem::ByteSequence(value) => {
            output.push(':');
            output.push_str(&base64_simd::STANDARD.encode_to_string(value));
            output.push(':');
        }
        BareItem::Boolean(true) => output.push_str("?1"),
        BareItem::Boolean(false) => output.push_str("?0"),
    }
}

fn write_decimal(output: &mut String, value: Decimal) {
    let thousandths = value.thousandths();
    if thousandths < 0 {
        output.push('-');
    }

    let abs = thousandths.unsigned_abs();
    let _ = write!(output, "{}.", abs / 1000);

    let fraction = abs % 1000;
    if fraction == 0 {
        output.push('0');
    } else {
        let digits = format!("{fraction:03}");
        output.push_str(digits.trim_end_matches('0'));
    }
}

#[cfg(test)]
mod test {
    use crate::structured::{
        BareItem, Decimal, Dictionary, InnerList, Item, Key, List, Parameters, SfString, Token,
    };

    #[test]
    fn canonicalises_whitespace_and_numeric_form() {
        let dict = Dictionary::parse("a=1.500 ,  b=?1;x , c=(1  2)").unwrap();
        assert_eq!(dict.serialise(), "a=1.5, b;x, c=(1 2)");
    }

    #[test]
    fn empty_containers_serialise_to_empty_string() {
        assert_eq!(Dictionary::new().serialise(), "");
        assert_eq!(List::default().serialise(), "");
    }

    #[test]
    fn string_escapes_round_trip() {
        let item = Item::new(SfString::new(r#"back\slash "quoted""#).unwrap());
        let serialised = item.serialise();
        assert_eq!(serialised, r#""back\\slash \"quoted\"""#);
        assert_eq!(Item::parse(&serialised).unwrap(), item);
    }

    #[test]
    fn boolean_true_parameter_omits_value() {
        let mut params = Parameters::new();
        params.insert(Key::new("a").unwrap(), true);
        params.insert(Key::new("b").unwrap(), false);
        let item = Item::with_params(Token::new("x").unwrap(), params);

        assert_eq!(item.serialise(), "x;a;b=?0");
    }

    #[test]
    fn decimal_fraction_trims_trailing_zeros() {
        let cases = [
            (1500, "1.5"),
            (1000, "1.0"),
            (-250, "-0.25"),
            (10, "0.01"),
            (1234, "1.234"),
        ];

        for (thousandths, expected) in cases {
            let item = Item::new(Decimal::from_thousandths(thousandths).unwrap());
            assert_eq!(item.serialise(), expected);
        }
    }

    #[test]
    fn inner_list_parameters_follow_close_paren() {
        let list = List::parse(r#"("a" "b");key=1"#).unwrap();
        assert_eq!(list.serialise(), r#"("a" "b");key=1"#);

        let inner = InnerList::new(vec![Item::new(BareItem::Boolean(false))]);
        assert_eq!(inner.serialise(), "(?0)");
    }
}
