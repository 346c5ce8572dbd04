//! Soil form validation integration tests
//!
//! A form is accepted exactly when every numeric field parses as a finite
//! number and a soil type is chosen.

use proptest::prelude::*;
use shared::{
    validate_soil_form, SoilField, SoilForm, SoilFormPatch, SoilType, WeatherConditions,
};

fn complete_form() -> SoilForm {
    SoilForm {
        n: "90".into(),
        p: "42".into(),
        k: "43".into(),
        temperature: "20.8".into(),
        humidity: "82".into(),
        ph: "6.5".into(),
        rainfall: "202.9".into(),
        soil_type: Some(SoilType::Clay),
    }
}

fn field_mut(form: &mut SoilForm, field: SoilField) -> &mut String {
    match field {
        SoilField::N => &mut form.n,
        SoilField::P => &mut form.p,
        SoilField::K => &mut form.k,
        SoilField::Temperature => &mut form.temperature,
        SoilField::Humidity => &mut form.humidity,
        SoilField::Ph => &mut form.ph,
        SoilField::Rainfall => &mut form.rainfall,
        SoilField::SoilType => unreachable!("soil type is not a text field"),
    }
}

const NUMERIC_FIELDS: [SoilField; 7] = [
    SoilField::N,
    SoilField::P,
    SoilField::K,
    SoilField::Temperature,
    SoilField::Humidity,
    SoilField::Ph,
    SoilField::Rainfall,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_complete_form_is_accepted() {
        let reading = validate_soil_form(&complete_form()).unwrap();
        assert_eq!(reading.measurements.n, 90.0);
        assert_eq!(reading.measurements.rainfall, 202.9);
        assert_eq!(reading.soil_type, SoilType::Clay);
    }

    #[test]
    fn test_blank_nitrogen_is_named() {
        let form = SoilForm {
            n: String::new(),
            ..complete_form()
        };
        let err = validate_soil_form(&form).unwrap_err();
        assert_eq!(err.missing, vec![SoilField::N]);
        assert_eq!(err.to_string(), "Please fill in all required fields: N");
    }

    #[test]
    fn test_all_problems_reported_together() {
        let form = SoilForm {
            p: "abc".into(),
            ph: "NaN".into(),
            soil_type: None,
            ..complete_form()
        };
        let err = validate_soil_form(&form).unwrap_err();
        assert_eq!(err.missing, vec![SoilField::P, SoilField::Ph, SoilField::SoilType]);
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let form = SoilForm {
            k: " 43 ".into(),
            ..complete_form()
        };
        assert!(validate_soil_form(&form).is_ok());
    }

    #[test]
    fn test_weather_prefill_keeps_typed_values() {
        let mut form = SoilForm {
            temperature: "19".into(),
            humidity: String::new(),
            rainfall: String::new(),
            ..complete_form()
        };
        form.fill_weather(&WeatherConditions {
            temperature_celsius: 31.2,
            humidity_percent: 55.0,
            rainfall_mm: 0.4,
        });

        assert_eq!(form.temperature, "19");
        assert_eq!(form.humidity, "55");
        assert_eq!(form.rainfall, "0.4");
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut form = complete_form();
        form.apply(SoilFormPatch {
            ph: Some("7.2".into()),
            soil_type: Some(SoilType::Peaty),
            ..Default::default()
        });

        assert_eq!(form.ph, "7.2");
        assert_eq!(form.soil_type, Some(SoilType::Peaty));
        assert_eq!(form.n, "90");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn arb_soil_type() -> impl Strategy<Value = SoilType> {
        prop::sample::select(SoilType::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any finite numbers plus a soil type are accepted unchanged
        #[test]
        fn prop_complete_form_accepted(
            values in prop::array::uniform7(-1.0e6f64..1.0e6),
            soil_type in arb_soil_type(),
        ) {
            let mut form = SoilForm { soil_type: Some(soil_type), ..SoilForm::default() };
            for (field, value) in NUMERIC_FIELDS.iter().zip(values) {
                *field_mut(&mut form, *field) = value.to_string();
            }

            let reading = validate_soil_form(&form);
            prop_assert!(reading.is_ok());
            let reading = reading.unwrap();
            prop_assert_eq!(reading.measurements.n, values[0]);
            prop_assert_eq!(reading.measurements.rainfall, values[6]);
            prop_assert_eq!(reading.soil_type, soil_type);
        }

        /// Breaking any single field rejects the form and names that field
        #[test]
        fn prop_single_bad_field_rejected(
            index in 0usize..7,
            bad in prop::sample::select(vec!["", "   ", "abc", "1.2.3", "inf", "NaN"]),
        ) {
            let field = NUMERIC_FIELDS[index];
            let mut form = complete_form();
            *field_mut(&mut form, field) = bad.to_string();

            let err = validate_soil_form(&form);
            prop_assert!(err.is_err());
            prop_assert_eq!(err.unwrap_err().missing, vec![field]);
        }

        /// No soil type means rejection whatever the numbers are
        #[test]
        fn prop_missing_soil_type_rejected(values in prop::array::uniform7(0.0f64..300.0)) {
            let mut form = SoilForm::default();
            for (field, value) in NUMERIC_FIELDS.iter().zip(values) {
                *field_mut(&mut form, *field) = value.to_string();
            }

            let err = validate_soil_form(&form).unwrap_err();
            prop_assert!(err.names(SoilField::SoilType));
            prop_assert_eq!(err.missing.len(), 1);
        }
    }
}
