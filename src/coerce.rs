//! Serde-помощники для значений из HTML-форм и строки запроса:
//! флаги удобств приходят как `"true"`/`"false"`, числа как текст,
//! множества через запятую.

use serde::{de, Deserialize, Deserializer, Serializer};
use std::{fmt::Display, str::FromStr};

/// Флаг установлен только для текста `true`, всё остальное `false`.
pub fn flag_from_str(value: &str) -> bool {
    value == "true"
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

impl From<FlagRepr> for bool {
    fn from(repr: FlagRepr) -> Self {
        match repr {
            FlagRepr::Bool(b) => b,
            FlagRepr::Text(s) => flag_from_str(&s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr<T> {
    Number(T),
    Text(String),
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    FlagRepr::deserialize(deserializer).map(Into::into)
}

pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlagRepr>::deserialize(deserializer)?.map(Into::into))
}

/// Число из текста. `NaN` и бесконечности не принимаются.
fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let text = text.trim();
    if text.parse::<f64>().is_ok_and(|value| !value.is_finite()) {
        return Err(format!("`{}` is not a finite number", text));
    }
    text.parse().map_err(|e: T::Err| e.to_string())
}

pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberRepr::<T>::deserialize(deserializer)? {
        NumberRepr::Number(n) => Ok(n),
        NumberRepr::Text(s) => parse_number(&s).map_err(de::Error::custom),
    }
}

/// Как [`number`], но пустая строка и `null` дают `None`.
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberRepr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberRepr::Number(n)) => Ok(Some(n)),
        Some(NumberRepr::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberRepr::Text(s)) => parse_number(&s).map(Some).map_err(de::Error::custom),
    }
}

/// Значение через [`FromStr`]; пустой текст означает отсутствие.
pub fn optional_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Пустая строка даёт `None`, остальные обрезаются по краям.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListRepr {
    List(Vec<String>),
    Text(String),
}

/// `a,b,c` или `["a", "b", "c"]`; пустые элементы пропускаются.
pub fn comma_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = match Option::<ListRepr>::deserialize(deserializer)? {
        None => return Ok(Vec::new()),
        Some(ListRepr::List(items)) => items,
        Some(ListRepr::Text(text)) => text.split(',').map(str::to_string).collect(),
    };

    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(de::Error::custom))
        .collect()
}

#[allow(clippy::ptr_arg)]
pub fn serialize_comma_list<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Display,
{
    let joined = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}
