//! Record layouts — the per-type field descriptor table the decoder walks.
//!
//! A record type describes itself once through [`Record::layout`] (class
//! name plus one [`FieldDescriptor`] per field, in declaration order) and
//! hands out a typed [`Slot`] for each settable field. The decoder never
//! inspects the Rust type itself; it only consumes the table and the slots.
//!
//! Most records are declared with [`wmi_record!`](crate::wmi_record), which
//! generates both halves.

use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Declared semantic kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Signed integer. Width in bits.
    Int(u8),
    /// Unsigned integer. Width in bits.
    Uint(u8),
    /// Floating point. Width in bits.
    Float(u8),
    Str,
    Bool,
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int(bits) => write!(f, "i{bits}"),
            FieldKind::Uint(bits) => write!(f, "u{bits}"),
            FieldKind::Float(bits) => write!(f, "f{bits}"),
            FieldKind::Str => write!(f, "string"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// One row of a record's field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Property name on the row; also the projected column in queries.
    pub name: &'static str,
    pub kind: FieldKind,
    /// `Option<T>` field: allocated before decoding, tolerates null.
    pub optional: bool,
    /// `false` for internal fields the decoder must not assign.
    pub settable: bool,
}

impl FieldDescriptor {
    /// Descriptor for a settable field of type `T`.
    pub fn of<T: FieldValue>(name: &'static str) -> Self {
        Self {
            name,
            kind: T::KIND,
            optional: T::OPTIONAL,
            settable: true,
        }
    }

    /// Descriptor for an internal field.
    pub fn internal<T: FieldValue>(name: &'static str) -> Self {
        Self {
            settable: false,
            ..Self::of::<T>(name)
        }
    }
}

/// The field table of a record type. Built once per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordLayout {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    /// Class name, e.g. `Win32_Process`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Mutable access to one field of a record, tagged by its concrete type.
#[derive(Debug)]
pub enum Slot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Str(&'a mut String),
    Bool(&'a mut bool),
    Timestamp(&'a mut DateTime<FixedOffset>),
}

impl Slot<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            Slot::I8(_) => FieldKind::Int(8),
            Slot::I16(_) => FieldKind::Int(16),
            Slot::I32(_) => FieldKind::Int(32),
            Slot::I64(_) => FieldKind::Int(64),
            Slot::U8(_) => FieldKind::Uint(8),
            Slot::U16(_) => FieldKind::Uint(16),
            Slot::U32(_) => FieldKind::Uint(32),
            Slot::U64(_) => FieldKind::Uint(64),
            Slot::F32(_) => FieldKind::Float(32),
            Slot::F64(_) => FieldKind::Float(64),
            Slot::Str(_) => FieldKind::Str,
            Slot::Bool(_) => FieldKind::Bool,
            Slot::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// Store a signed integer into any integer slot. Narrows by truncation;
    /// unsigned slots receive the two's-complement reinterpretation.
    /// Returns `false` (and leaves the field alone) for non-integer slots.
    pub fn set_signed(self, v: i64) -> bool {
        match self {
            Slot::I8(f) => *f = v as i8,
            Slot::I16(f) => *f = v as i16,
            Slot::I32(f) => *f = v as i32,
            Slot::I64(f) => *f = v,
            Slot::U8(f) => *f = v as u8,
            Slot::U16(f) => *f = v as u16,
            Slot::U32(f) => *f = v as u32,
            Slot::U64(f) => *f = v as u64,
            _ => return false,
        }
        true
    }

    /// Unsigned counterpart of [`Slot::set_signed`].
    pub fn set_unsigned(self, v: u64) -> bool {
        match self {
            Slot::I8(f) => *f = v as i8,
            Slot::I16(f) => *f = v as i16,
            Slot::I32(f) => *f = v as i32,
            Slot::I64(f) => *f = v as i64,
            Slot::U8(f) => *f = v as u8,
            Slot::U16(f) => *f = v as u16,
            Slot::U32(f) => *f = v as u32,
            Slot::U64(f) => *f = v,
            _ => return false,
        }
        true
    }
}

/// A Rust type that can back a record field.
pub trait FieldValue: Default {
    const KIND: FieldKind;
    const OPTIONAL: bool = false;

    fn slot(&mut self) -> Slot<'_>;
}

macro_rules! field_value {
    ($($ty:ty => $variant:ident, $kind:expr;)*) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = $kind;

                fn slot(&mut self) -> Slot<'_> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

field_value! {
    i8 => I8, FieldKind::Int(8);
    i16 => I16, FieldKind::Int(16);
    i32 => I32, FieldKind::Int(32);
    i64 => I64, FieldKind::Int(64);
    u8 => U8, FieldKind::Uint(8);
    u16 => U16, FieldKind::Uint(16);
    u32 => U32, FieldKind::Uint(32);
    u64 => U64, FieldKind::Uint(64);
    f32 => F32, FieldKind::Float(32);
    f64 => F64, FieldKind::Float(64);
    String => Str, FieldKind::Str;
    bool => Bool, FieldKind::Bool;
    DateTime<FixedOffset> => Timestamp, FieldKind::Timestamp;
}

/// Optional fields are reset to `Some(T::default())` when their slot is
/// taken, and the inner value is decoded in place.
impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: FieldKind = T::KIND;
    const OPTIONAL: bool = true;

    fn slot(&mut self) -> Slot<'_> {
        self.insert(T::default()).slot()
    }
}

/// A caller-defined destination type populated field by field from a row.
pub trait Record: Default + 'static {
    /// The field table, in declaration order.
    fn layout() -> &'static RecordLayout;

    /// Mutable access to the field at `index` of [`Record::layout`].
    /// Returns `None` for internal fields.
    fn slot(&mut self, index: usize) -> Option<Slot<'_>>;
}

/// Declares a record struct together with its [`Record`] implementation.
///
/// A field declared `= "Prop" as internal` stays in the layout but is never
/// assigned; decoding such a record fails with an unsettable-field error.
///
/// ```
/// use wmiquery_core::wmi_record;
///
/// wmi_record! {
///     #[derive(Debug, Default)]
///     pub struct OperatingSystem as "Win32_OperatingSystem" {
///         pub caption: String = "Caption",
///         pub free_physical_memory: Option<u64> = "FreePhysicalMemory",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wmi_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $class:literal {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $prop:literal $(as $flag:ident)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::record::Record for $name {
            fn layout() -> &'static $crate::record::RecordLayout {
                static LAYOUT: ::std::sync::OnceLock<$crate::record::RecordLayout> =
                    ::std::sync::OnceLock::new();
                LAYOUT.get_or_init(|| {
                    $crate::record::RecordLayout::new(
                        $class,
                        ::std::vec![
                            $($crate::__wmi_descriptor!($ty, $prop $(, $flag)?),)*
                        ],
                    )
                })
            }

            #[allow(unused_assignments)]
            fn slot(&mut self, index: usize) -> ::std::option::Option<$crate::record::Slot<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::__wmi_slot!(&mut self.$field $(, $flag)?);
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wmi_descriptor {
    ($ty:ty, $prop:literal) => {
        $crate::record::FieldDescriptor::of::<$ty>($prop)
    };
    ($ty:ty, $prop:literal, internal) => {
        $crate::record::FieldDescriptor::internal::<$ty>($prop)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wmi_slot {
    ($place:expr) => {
        ::std::option::Option::Some($crate::record::FieldValue::slot($place))
    };
    ($place:expr, internal) => {
        ::std::option::Option::None
    };
}
