//! sea-orm column support. Custom dates and times are stored as text.

use sea_orm::sea_query::{ArrayType, ColumnType, Nullable, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, DbErr, QueryResult, TryGetError, TryGetable, Value};

use crate::date::CustomDate;
use crate::null::{Null, Zeroable};
use crate::sql::SqlValue;
use crate::time::CustomTime;

macro_rules! text_column {
    ($ty:ty, $name:literal) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::String(value.to_sql().map(Box::new))
            }
        }

        impl TryGetable for $ty {
            fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
                let text = Option::<String>::try_get_by(res, index)?;
                <$ty>::scan(SqlValue::from(text))
                    .map_err(|e| TryGetError::DbErr(DbErr::Type(e.to_string())))
            }
        }

        impl ValueType for $ty {
            fn try_from(value: Value) -> Result<Self, ValueTypeErr> {
                match value {
                    Value::String(Some(text)) => <$ty>::detect(&text).map_err(|_| ValueTypeErr),
                    Value::String(None) => Ok(<$ty>::default()),
                    _ => Err(ValueTypeErr),
                }
            }

            fn type_name() -> String {
                $name.to_owned()
            }

            fn array_type() -> ArrayType {
                ArrayType::String
            }

            fn column_type() -> ColumnType {
                ColumnType::Text
            }
        }

        impl Nullable for $ty {
            fn null() -> Value {
                Value::String(None)
            }
        }
    };
}

text_column!(CustomDate, "CustomDate");
text_column!(CustomTime, "CustomTime");

impl<T> From<Null<T>> for Value
where
    T: Into<Value> + Nullable,
{
    fn from(value: Null<T>) -> Self {
        match value.0 {
            Some(inner) => inner.into(),
            None => T::null(),
        }
    }
}

impl<T> TryGetable for Null<T>
where
    T: TryGetable + Zeroable,
{
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        Option::<T>::try_get_by(res, index).map(|value| Null(value.filter(|v| !v.is_zero())))
    }
}

impl<T> ValueType for Null<T>
where
    T: ValueType + Nullable,
{
    fn try_from(value: Value) -> Result<Self, ValueTypeErr> {
        <Option<T> as ValueType>::try_from(value).map(Null)
    }

    fn type_name() -> String {
        format!("Null<{}>", T::type_name())
    }

    fn array_type() -> ArrayType {
        T::array_type()
    }

    fn column_type() -> ColumnType {
        T::column_type()
    }
}

impl<T: Nullable> Nullable for Null<T> {
    fn null() -> Value {
        T::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_date_is_stored_as_null() {
        assert_eq!(Value::from(CustomDate::default()), Value::String(None));
        let date = CustomDate::parse("2024-01-26", false).unwrap();
        assert_eq!(
            Value::from(date),
            Value::String(Some(Box::new("2024-01-26Z".to_string())))
        );
    }

    #[test]
    fn null_wrapper_delegates() {
        let value: Value = Null::<i64>::null().into();
        assert_eq!(value, Value::BigInt(None));
        let value: Value = Null::new(true).into();
        assert_eq!(value, Value::Bool(Some(true)));
    }

    #[test]
    fn value_type_round_trip() {
        let value = Value::String(Some(Box::new("10:55:00Z".to_string())));
        let time = <CustomTime as ValueType>::try_from(value).unwrap();
        assert_eq!(time.to_string(), "10:55:00Z");

        let null = <Null<CustomTime> as ValueType>::try_from(Value::String(None)).unwrap();
        assert!(null.is_null());
    }
}
