// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API method responses.

use std::collections::BTreeMap;

use crate::params::Params;
use crate::transport::RawResponse;

/// Error code reported when a body cannot be parsed.
pub const UNPARSABLE_RESPONSE_CODE: i32 = 500;

/// Parsed response of an API method call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status_code: u16,
    pub error_code: i32,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
    pub data: Params,
    pub body: String,
    /// Response headers, names lower-cased.
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    /// Parse a raw JSON response. `errorCode` defaults to 0.
    pub fn from_raw(raw: RawResponse) -> Self {
        let body = raw.body.trim().to_string();
        let mut response = Self {
            status_code: raw.status_code,
            error_code: 0,
            error_message: None,
            error_details: None,
            data: Params::new(),
            body,
            headers: raw.headers,
        };

        if !response.body.starts_with('{') {
            response.error_code = UNPARSABLE_RESPONSE_CODE;
            response.error_message = Some(format!(
                "unexpected non-JSON response (HTTP {})",
                raw.status_code
            ));
            return response;
        }

        match Params::from_json(&response.body) {
            Ok(data) => {
                match data.get_int("errorCode", 0) {
                    Ok(code) => response.error_code = code,
                    Err(e) => {
                        response.error_code = UNPARSABLE_RESPONSE_CODE;
                        response.error_message = Some(e.to_string());
                    }
                }
                if response.error_message.is_none() {
                    response.error_message = optional_string(&data, "errorMessage");
                }
                response.error_details = optional_string(&data, "errorDetails");
                response.data = data;
            }
            Err(e) => {
                response.error_code = UNPARSABLE_RESPONSE_CODE;
                response.error_message = Some(e.to_string());
            }
        }
        response
    }

    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

fn optional_string(data: &Params, key: &str) -> Option<String> {
    data.get(key).and_then(|v| v.signing_value())
}
