//! Validate-on-construct views of caller-supplied messages.
//!
//! An [`Adapted<T>`] only exists once `T::decode` has succeeded, so a call
//! site that takes `&T` can be handed `&*adapted` with no further checks.
//! The original message is kept alongside, including any keys this
//! version of the bridge does not understand.

use core::ops::Deref;

use super::MessageCodec;
use super::message::DynamicMessage;
use crate::error::CodecError;
use crate::model::{AssetLocation, PackLocation, PackState, PackStates};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapted<T> {
    entity: T,
    source: DynamicMessage,
}

impl<T: MessageCodec> Adapted<T> {
    pub fn new(source: DynamicMessage) -> Result<Self, CodecError> {
        let entity = T::decode(&source)?;
        Ok(Self { entity, source })
    }

    /// The message this view was built from.
    pub fn source(&self) -> &DynamicMessage {
        &self.source
    }

    /// Keys present in the source that `T` does not read.
    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.source.keys().filter(|k| !T::KEYS.iter().any(|known| known == k))
    }

    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Adapted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> AsRef<T> for Adapted<T> {
    fn as_ref(&self) -> &T {
        &self.entity
    }
}

macro_rules! impl_try_from_message {
    ($($ty:ty),* $(,)?) => {$(
        impl TryFrom<&DynamicMessage> for $ty {
            type Error = CodecError;

            fn try_from(msg: &DynamicMessage) -> Result<Self, CodecError> {
                <$ty as MessageCodec>::decode(msg)
            }
        }

        impl TryFrom<DynamicMessage> for Adapted<$ty> {
            type Error = CodecError;

            fn try_from(msg: DynamicMessage) -> Result<Self, CodecError> {
                Adapted::new(msg)
            }
        }
    )*};
}

impl_try_from_message!(AssetLocation, PackLocation, PackState, PackStates);
