mod id_macro;

use serde::{Deserialize, Serialize};

use id_macro::impl_id;

/// Server-issued correlation id binding an OTP send to its verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

/// Server-assigned visitor identity returned by the selfie upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitorId(String);

/// Client-side identity of one captured or selected photo instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(String);

impl_id!(TransactionId, VisitorId, PhotoId);
