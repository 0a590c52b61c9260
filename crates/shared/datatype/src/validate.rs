//! `validator` integration: null and zero values fail `required`.

use validator::ValidateRequired;

use crate::date::CustomDate;
use crate::null::{Null, Zeroable};
use crate::time::CustomTime;

impl<T: Zeroable> ValidateRequired for Null<T> {
    fn is_some(&self) -> bool {
        self.0.as_ref().is_some_and(|v| !v.is_zero())
    }
}

impl ValidateRequired for CustomDate {
    fn is_some(&self) -> bool {
        !self.is_zero()
    }
}

impl ValidateRequired for CustomTime {
    fn is_some(&self) -> bool {
        !self.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null::{NullDate, NullString};
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(required)]
        hobby: NullString,
        #[validate(required)]
        birth: CustomDate,
        #[validate(required)]
        seen: NullDate,
    }

    #[test]
    fn null_and_zero_fail_required() {
        let form = Form {
            hobby: Null::null(),
            birth: CustomDate::default(),
            seen: Null::new(CustomDate::default()),
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("hobby"));
        assert!(fields.contains_key("birth"));
        assert!(fields.contains_key("seen"));
    }

    #[test]
    fn set_values_pass_required() {
        let form = Form {
            hobby: Null::new("Cooking".into()),
            birth: CustomDate::parse("2000-01-01", false).unwrap(),
            seen: Null::new(CustomDate::now(false)),
        };
        assert!(form.validate().is_ok());
    }
}
