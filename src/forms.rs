//! Structural validation of submitted forms.
//!
//! Everything here is pure: the choice lists a select field accepts are
//! handed in by the caller, so no function in this module touches the
//! database. Domain rules (batch availability, stock sufficiency) live in
//! `services`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

/// Date format accepted by date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One option of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Choice {
    pub id: i32,
    pub label: String,
}

impl Choice {
    pub fn new(id: i32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// The options a select field accepts, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn contains(&self, id: i32) -> bool {
        self.choices.iter().any(|c| c.id == id)
    }

    pub fn as_slice(&self) -> &[Choice] {
        &self.choices
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }
}

impl FromIterator<Choice> for ChoiceSet {
    fn from_iter<I: IntoIterator<Item = Choice>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Category of a shrinkage record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkageKind {
    #[strum(serialize = "caducidad")]
    #[serde(rename = "caducidad")]
    Expired,
    #[strum(serialize = "rotura")]
    #[serde(rename = "rotura")]
    Broken,
    #[strum(serialize = "defecto")]
    #[serde(rename = "defecto")]
    Defective,
    #[strum(serialize = "contaminacion")]
    #[serde(rename = "contaminacion")]
    Contaminated,
    #[strum(serialize = "otro")]
    #[serde(rename = "otro")]
    Other,
}

impl ShrinkageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Expired => "Caducidad",
            Self::Broken => "Rotura",
            Self::Defective => "Defecto",
            Self::Contaminated => "Contaminación",
            Self::Other => "Otro",
        }
    }
}

/// Option of the shrinkage-kind select field.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KindChoice {
    pub value: ShrinkageKind,
    pub label: String,
}

pub fn shrinkage_kind_choices() -> Vec<KindChoice> {
    ShrinkageKind::iter()
        .map(|value| KindChoice {
            value,
            label: value.label().to_string(),
        })
        .collect()
}

/// Raw "new cookie" form as submitted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewCookieForm {
    pub nombre_galleta: Option<String>,
    pub receta_id: Option<String>,
}

/// A validated request to create a cookie in every packaging type.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CreateCookie {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub recipe_id: i32,
}

impl NewCookieForm {
    /// Checks the form against the active recipes offered to the user.
    pub fn clean(&self, active_recipes: &ChoiceSet) -> Result<CreateCookie, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "nombre_galleta", self.nombre_galleta.as_deref());
        let recipe_id = required_choice(
            &mut errors,
            "receta_id",
            self.receta_id.as_deref(),
            active_recipes,
        );

        match (name, recipe_id) {
            (Some(name), Some(recipe_id)) if errors.errors().is_empty() => {
                let cmd = CreateCookie { name, recipe_id };
                cmd.validate()?;
                Ok(cmd)
            }
            _ => Err(errors),
        }
    }
}

/// Raw shrinkage form as submitted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ShrinkageForm {
    pub galleta_id: Option<String>,
    pub cantidad: Option<String>,
    pub tipo_merma: Option<String>,
    pub descripcion: Option<String>,
    pub fecha: Option<String>,
}

/// A validated shrinkage request.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct RecordShrinkage {
    pub cookie_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub kind: ShrinkageKind,
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    pub date: NaiveDate,
}

impl ShrinkageForm {
    /// Checks the form against the cookies currently eligible for shrinkage.
    pub fn clean(&self, eligible: &ChoiceSet) -> Result<RecordShrinkage, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let cookie_id = required_choice(&mut errors, "galleta_id", self.galleta_id.as_deref(), eligible);
        let quantity = required_parsed::<i32>(&mut errors, "cantidad", self.cantidad.as_deref());
        let kind = required_parsed::<ShrinkageKind>(&mut errors, "tipo_merma", self.tipo_merma.as_deref());
        let description = required_text(&mut errors, "descripcion", self.descripcion.as_deref());
        let date = required_date(&mut errors, "fecha", self.fecha.as_deref());

        match (cookie_id, quantity, kind, description, date) {
            (Some(cookie_id), Some(quantity), Some(kind), Some(description), Some(date))
                if errors.errors().is_empty() =>
            {
                let cmd = RecordShrinkage {
                    cookie_id,
                    quantity,
                    kind,
                    description,
                    date,
                };
                cmd.validate()?;
                Ok(cmd)
            }
            _ => Err(errors),
        }
    }
}

fn field_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
}

fn present<'a>(errors: &mut ValidationErrors, field: &'static str, raw: Option<&'a str>) -> Option<&'a str> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            field_error(errors, field, "required", "This field is required");
            None
        }
    }
}

fn required_text(errors: &mut ValidationErrors, field: &'static str, raw: Option<&str>) -> Option<String> {
    present(errors, field, raw).map(str::to_string)
}

fn required_parsed<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<T> {
    let value = present(errors, field, raw)?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            field_error(errors, field, "invalid", "Not a valid value");
            None
        }
    }
}

fn required_choice(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    choices: &ChoiceSet,
) -> Option<i32> {
    let id = required_parsed::<i32>(errors, field, raw)?;
    if choices.contains(id) {
        Some(id)
    } else {
        field_error(errors, field, "choice", "Not a valid choice");
        None
    }
}

fn required_date(errors: &mut ValidationErrors, field: &'static str, raw: Option<&str>) -> Option<NaiveDate> {
    let value = present(errors, field, raw)?;
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            field_error(errors, field, "date", "Not a valid date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible() -> ChoiceSet {
        ChoiceSet::new(vec![Choice::new(1, "Chocolate"), Choice::new(4, "Nuez")])
    }

    fn valid_shrinkage() -> ShrinkageForm {
        ShrinkageForm {
            galleta_id: Some("1".into()),
            cantidad: Some("7".into()),
            tipo_merma: Some("rotura".into()),
            descripcion: Some("Charola caída".into()),
            fecha: Some("2024-03-01".into()),
        }
    }

    #[test]
    fn clean_shrinkage_form_produces_typed_request() {
        let cmd = valid_shrinkage().clean(&eligible()).unwrap();
        assert_eq!(cmd.cookie_id, 1);
        assert_eq!(cmd.quantity, 7);
        assert_eq!(cmd.kind, ShrinkageKind::Broken);
        assert_eq!(cmd.description, "Charola caída");
        assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn cookie_outside_eligible_set_is_rejected() {
        let mut form = valid_shrinkage();
        form.galleta_id = Some("2".into());
        let errors = form.clean(&eligible()).unwrap_err();
        assert!(errors.field_errors().contains_key("galleta_id"));
    }

    #[test]
    fn zero_or_negative_quantity_is_rejected() {
        for raw in ["0", "-3"] {
            let mut form = valid_shrinkage();
            form.cantidad = Some(raw.into());
            let errors = form.clean(&eligible()).unwrap_err();
            assert!(errors.field_errors().contains_key("quantity"), "{raw}");
        }
    }

    #[test]
    fn missing_and_malformed_fields_are_all_reported() {
        let form = ShrinkageForm {
            galleta_id: Some("abc".into()),
            cantidad: None,
            tipo_merma: Some("derretida".into()),
            descripcion: Some("   ".into()),
            fecha: Some("01/03/2024".into()),
        };
        let errors = form.clean(&eligible()).unwrap_err();
        let fields = errors.field_errors();
        for field in ["galleta_id", "cantidad", "tipo_merma", "descripcion", "fecha"] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn new_cookie_form_requires_active_recipe() {
        let recipes = ChoiceSet::new(vec![Choice::new(3, "Base mantequilla")]);
        let ok = NewCookieForm {
            nombre_galleta: Some("  Chocolate ".into()),
            receta_id: Some("3".into()),
        }
        .clean(&recipes)
        .unwrap();
        assert_eq!(
            ok,
            CreateCookie {
                name: "Chocolate".into(),
                recipe_id: 3
            }
        );

        let errors = NewCookieForm {
            nombre_galleta: Some("Chocolate".into()),
            receta_id: Some("9".into()),
        }
        .clean(&recipes)
        .unwrap_err();
        assert!(errors.field_errors().contains_key("receta_id"));
    }

    #[test]
    fn overlong_cookie_name_is_rejected() {
        let recipes = ChoiceSet::new(vec![Choice::new(3, "Base")]);
        let errors = NewCookieForm {
            nombre_galleta: Some("x".repeat(101)),
            receta_id: Some("3".into()),
        }
        .clean(&recipes)
        .unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn shrinkage_kinds_round_trip_through_their_form_value() {
        for choice in shrinkage_kind_choices() {
            let parsed: ShrinkageKind = choice.value.as_ref().parse().unwrap();
            assert_eq!(parsed, choice.value);
        }
        assert_eq!(ShrinkageKind::Expired.to_string(), "caducidad");
    }
}
