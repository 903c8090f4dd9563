use crate::proto::Type;

use super::{SignatureError, SignatureErrorKind, MAX_CONTAINER_DEPTH, MAX_DEPTH, MAX_SIGNATURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    None,
    Array,
    Struct,
    Dict,
}

/// Validate a signature.
///
/// Structs and dict entries share one depth budget, arrays have their own.
pub(super) const fn validate(bytes: &[u8]) -> Result<(), SignatureError> {
    use SignatureErrorKind::*;

    if bytes.len() > MAX_SIGNATURE {
        return Err(SignatureError::new(SignatureTooLong));
    }

    let mut stack = [(Kind::None, 0u8); MAX_DEPTH];
    let mut len = 0;
    let mut arrays = 0;
    let mut structs = 0;
    let mut n = 0;

    while n < bytes.len() {
        let t = Type::new(bytes[n]);
        n += 1;

        let mut is_basic = match t {
            Type::BYTE
            | Type::BOOLEAN
            | Type::INT16
            | Type::UINT16
            | Type::INT32
            | Type::UINT32
            | Type::INT64
            | Type::UINT64
            | Type::DOUBLE
            | Type::STRING
            | Type::OBJECT_PATH
            | Type::SIGNATURE
            | Type::UNIX_FD => true,
            Type::VARIANT => false,
            Type::ARRAY => {
                if len == MAX_DEPTH || arrays == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumArrayRecursion));
                }

                stack[len] = (Kind::Array, 0);
                len += 1;
                arrays += 1;
                continue;
            }
            Type::OPEN_PAREN => {
                if len == MAX_DEPTH || structs == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumStructRecursion));
                }

                stack[len] = (Kind::Struct, 0);
                len += 1;
                structs += 1;
                continue;
            }
            Type::OPEN_BRACE => {
                if len == MAX_DEPTH || structs == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumDictRecursion));
                }

                stack[len] = (Kind::Dict, 0);
                len += 1;
                structs += 1;
                continue;
            }
            Type::CLOSE_PAREN => {
                if len == 0 {
                    return Err(SignatureError::new(StructEndedButNotStarted));
                }

                len -= 1;

                match stack[len] {
                    (Kind::Struct, 0) => {
                        return Err(SignatureError::new(StructHasNoFields));
                    }
                    (Kind::Struct, _) => {}
                    (Kind::Array, _) => {
                        return Err(SignatureError::new(MissingArrayElementType));
                    }
                    _ => {
                        return Err(SignatureError::new(StructEndedButNotStarted));
                    }
                }

                structs -= 1;
                false
            }
            Type::CLOSE_BRACE => {
                if len == 0 {
                    return Err(SignatureError::new(DictEndedButNotStarted));
                }

                len -= 1;

                match stack[len] {
                    (Kind::Dict, 0) => {
                        return Err(SignatureError::new(DictEntryHasNoFields));
                    }
                    (Kind::Dict, 1) => {
                        return Err(SignatureError::new(DictEntryHasOnlyOneField));
                    }
                    (Kind::Dict, 2) => {}
                    (Kind::Dict, _) => {
                        return Err(SignatureError::new(DictEntryHasTooManyFields));
                    }
                    (Kind::Array, _) => {
                        return Err(SignatureError::new(MissingArrayElementType));
                    }
                    _ => {
                        return Err(SignatureError::new(DictEndedButNotStarted));
                    }
                }

                if len == 0 || !matches!(stack[len - 1].0, Kind::Array) {
                    return Err(SignatureError::new(DictEntryNotInsideArray));
                }

                structs -= 1;
                false
            }
            t => return Err(SignatureError::new(UnknownTypeCode(t))),
        };

        // A complete type closes every array waiting for an element.
        while len > 0 && matches!(stack[len - 1].0, Kind::Array) {
            len -= 1;
            arrays -= 1;
            is_basic = false;
        }

        if len > 0 {
            let (kind, fields) = stack[len - 1];

            if matches!(kind, Kind::Dict) && fields == 0 && !is_basic {
                return Err(SignatureError::new(DictKeyMustBeBasicType));
            }

            stack[len - 1] = (kind, fields.saturating_add(1));
        }
    }

    if len > 0 {
        return Err(SignatureError::new(match stack[len - 1].0 {
            Kind::Array => MissingArrayElementType,
            Kind::Struct => StructStartedButNotEnded,
            _ => DictStartedButNotEnded,
        }));
    }

    Ok(())
}
