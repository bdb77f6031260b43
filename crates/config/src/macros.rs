/// Declares a fieldless enum whose string forms come from [`strum`].
///
/// The enum gets `Display`, `FromStr` and `to_str`, serializes as its canonical string, and
/// deserializes from any string `FromStr` accepts. Enums spelled as numbers, like
/// [`OptLevel`](crate::OptLevel), also deserialize from bare unsigned integers.
macro_rules! str_enum {
    ($(#[$attr:meta])* $vis:vis enum $name:ident { $( $(#[$var_attr:meta])* $var:ident),* $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(strum::IntoStaticStr, strum::EnumIter, strum::EnumString, strum::VariantNames)]
        $(#[$attr])*
        $vis enum $name {
            $(
                $(#[$var_attr])*
                $var
            ),*
        }

        impl $name {
            /// Returns the canonical string form of `self`.
            pub fn to_str(self) -> &'static str {
                self.into()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.to_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.to_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(crate::macros::StrVisitor::<Self>(std::marker::PhantomData))
            }
        }
    };
}

/// Deserializes a `str_enum!` from a string or an unsigned integer.
pub(crate) struct StrVisitor<T>(pub(crate) std::marker::PhantomData<T>);

impl<T: std::str::FromStr + strum::VariantNames> serde::de::Visitor<'_> for StrVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "one of {:?}", T::VARIANTS)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<T, E> {
        v.parse().map_err(|_| E::unknown_variant(v, T::VARIANTS))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<T, E> {
        self.visit_str(&v.to_string())
    }
}
