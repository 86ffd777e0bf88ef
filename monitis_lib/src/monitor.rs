//! Request and response types for the external-monitor actions.
//!
//! See <http://www.monitis.com/docs/apiActions.html#editExternalMonitor>.

use crate::error::{ApiError, Error};
use serde::{Deserialize, Serialize};

/// Action name sent with every edit request.
pub const EDIT_EXTERNAL_MONITOR_ACTION: &str = "editExternalMonitor";

/// One optional parameter of the edit-monitor action.
///
/// [`MonitorParam::ALL`] together with [`MonitorParam::wire_name`] is the whole
/// wire contract for the optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorParam {
    Name,
    Url,
    LocationIdIntervalPairs,
    Timeout,
    Tag,
    PostData,
    ContentMatchString,
    ContentMatchFlag,
    Params,
    UptimeSla,
    ResponseSla,
    BasicUserAuth,
    BasicAuthPass,
    Header,
    Sni,
    IsVersion11,
    UserAgent,
    OrderId,
    IsIpv6,
}

impl MonitorParam {
    /// All parameters in the order they are written to the form body.
    pub const ALL: [MonitorParam; 19] = [
        MonitorParam::Name,
        MonitorParam::Url,
        MonitorParam::LocationIdIntervalPairs,
        MonitorParam::Timeout,
        MonitorParam::Tag,
        MonitorParam::PostData,
        MonitorParam::ContentMatchString,
        MonitorParam::ContentMatchFlag,
        MonitorParam::Params,
        MonitorParam::UptimeSla,
        MonitorParam::ResponseSla,
        MonitorParam::BasicUserAuth,
        MonitorParam::BasicAuthPass,
        MonitorParam::Header,
        MonitorParam::Sni,
        MonitorParam::IsVersion11,
        MonitorParam::UserAgent,
        MonitorParam::OrderId,
        MonitorParam::IsIpv6,
    ];

    /// Form parameter name used by the API.
    pub const fn wire_name(self) -> &'static str {
        match self {
            MonitorParam::Name => "name",
            MonitorParam::Url => "url",
            MonitorParam::LocationIdIntervalPairs => "locationIds",
            MonitorParam::Timeout => "timeout",
            MonitorParam::Tag => "tag",
            MonitorParam::PostData => "postData",
            MonitorParam::ContentMatchString => "contentMatchString",
            MonitorParam::ContentMatchFlag => "contentMatchFlag",
            MonitorParam::Params => "params",
            MonitorParam::UptimeSla => "uptimeSLA",
            MonitorParam::ResponseSla => "responseSLA",
            MonitorParam::BasicUserAuth => "basicUserAuth",
            MonitorParam::BasicAuthPass => "basicAuthPass",
            MonitorParam::Header => "header",
            MonitorParam::Sni => "sni",
            MonitorParam::IsVersion11 => "isversion_1_1",
            MonitorParam::UserAgent => "userAgent",
            MonitorParam::OrderId => "orderId",
            MonitorParam::IsIpv6 => "isIPv6",
        }
    }
}

/// Settings to change on an existing external monitor.
///
/// Every field is optional; only the fields that are set end up in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditExternalMonitorOptions {
    /// Name of the test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Url to test. Must not contain the protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Location id and check interval pairs separated by commas, e.g. `1-5,2-10`
    /// (intervals in minutes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id_interval_pairs: Option<String>,

    /// Milliseconds for ping monitors (max 5000), seconds otherwise (max 50).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,

    /// Group name, or list of groups such as `["dev", "ops"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Data to send with a POST check, e.g. `m_U=asd&m_P=asd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,

    /// Text to match in the response. For match flags 3-6 this is a comma
    /// separated list of unicode-encoded strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_match_string: Option<String>,

    /// 1: must contain, 0: must not contain, 3: all of, 4: at least one of,
    /// 5: not all of, 6: none of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_match_flag: Option<i64>,

    /// Extra monitor parameters as `key1:value1;key2:value2;`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,

    /// Minimal allowed uptime (%).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_sla: Option<i64>,

    /// Maximal allowed response time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_sla: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_user_auth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_pass: Option<String>,

    /// Request headers as `name1:value1;name2:value2;`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Use Server Name Indication (HTTPS and SOAP).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<bool>,

    /// Force HTTP/1.1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_version_1_1: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Order the monitor belongs to. Required for reseller client accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ipv6: Option<bool>,
}

impl EditExternalMonitorOptions {
    /// Wire value of a single parameter, or `None` when it is not set.
    pub fn value(&self, param: MonitorParam) -> Option<String> {
        match param {
            MonitorParam::Name => self.name.clone(),
            MonitorParam::Url => self.url.clone(),
            MonitorParam::LocationIdIntervalPairs => self.location_id_interval_pairs.clone(),
            MonitorParam::Timeout => self.timeout.map(|v| v.to_string()),
            MonitorParam::Tag => self.tag.clone(),
            MonitorParam::PostData => self.post_data.clone(),
            MonitorParam::ContentMatchString => self.content_match_string.clone(),
            MonitorParam::ContentMatchFlag => self.content_match_flag.map(|v| v.to_string()),
            MonitorParam::Params => self.params.clone(),
            MonitorParam::UptimeSla => self.uptime_sla.map(|v| v.to_string()),
            MonitorParam::ResponseSla => self.response_sla.map(|v| v.to_string()),
            MonitorParam::BasicUserAuth => self.basic_user_auth.clone(),
            MonitorParam::BasicAuthPass => self.basic_auth_pass.clone(),
            MonitorParam::Header => self.header.clone(),
            MonitorParam::Sni => self.sni.map(flag),
            MonitorParam::IsVersion11 => self.is_version_1_1.map(flag),
            MonitorParam::UserAgent => self.user_agent.clone(),
            MonitorParam::OrderId => self.order_id.map(|v| v.to_string()),
            MonitorParam::IsIpv6 => self.is_ipv6.map(flag),
        }
    }

    /// Form pairs for the fields that are set, in [`MonitorParam::ALL`] order.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        MonitorParam::ALL
            .iter()
            .filter_map(|p| self.value(*p).map(|v| (p.wire_name(), v)))
            .collect()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        MonitorParam::ALL.iter().all(|p| self.value(*p).is_none())
    }

    /// Overlay `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: EditExternalMonitorOptions) -> Self {
        Self {
            name: overrides.name.or(self.name),
            url: overrides.url.or(self.url),
            location_id_interval_pairs: overrides
                .location_id_interval_pairs
                .or(self.location_id_interval_pairs),
            timeout: overrides.timeout.or(self.timeout),
            tag: overrides.tag.or(self.tag),
            post_data: overrides.post_data.or(self.post_data),
            content_match_string: overrides.content_match_string.or(self.content_match_string),
            content_match_flag: overrides.content_match_flag.or(self.content_match_flag),
            params: overrides.params.or(self.params),
            uptime_sla: overrides.uptime_sla.or(self.uptime_sla),
            response_sla: overrides.response_sla.or(self.response_sla),
            basic_user_auth: overrides.basic_user_auth.or(self.basic_user_auth),
            basic_auth_pass: overrides.basic_auth_pass.or(self.basic_auth_pass),
            header: overrides.header.or(self.header),
            sni: overrides.sni.or(self.sni),
            is_version_1_1: overrides.is_version_1_1.or(self.is_version_1_1),
            user_agent: overrides.user_agent.or(self.user_agent),
            order_id: overrides.order_id.or(self.order_id),
            is_ipv6: overrides.is_ipv6.or(self.is_ipv6),
        }
    }
}

fn flag(b: bool) -> String {
    String::from(if b { "1" } else { "0" })
}

/// Response envelope of the edit action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditExternalMonitorOutput {
    /// Empty, `null` or absent when there is no error.
    #[serde(default)]
    pub error: Option<String>,

    /// `"ok"` on success, otherwise an error description.
    #[serde(default)]
    pub status: Option<String>,
}

impl EditExternalMonitorOutput {
    /// Success only when `error` is empty and `status` is exactly `"ok"`.
    pub fn into_result(self) -> Result<(), Error> {
        if let Some(message) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(Error::Api(ApiError::new(
                message,
                serde_json::to_value(&self).ok(),
            )));
        }
        if self.status.as_deref() == Some("ok") {
            Ok(())
        } else {
            Err(Error::Status(self.status))
        }
    }
}

/// Response of the `authToken` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthTokenOutput {
    #[serde(rename = "authToken", default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn envelope(body: &str) -> EditExternalMonitorOutput {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn wire_names_are_unique() {
        let names: HashSet<&str> = MonitorParam::ALL.iter().map(|p| p.wire_name()).collect();
        assert_eq!(names.len(), MonitorParam::ALL.len());
        for fixed in ["action", "testId", "apikey", "authToken"] {
            assert!(!names.contains(fixed));
        }
    }

    #[test]
    fn empty_options_produce_no_params() {
        let opts = EditExternalMonitorOptions::default();
        assert!(opts.is_empty());
        assert!(opts.to_form().is_empty());
    }

    #[test]
    fn only_set_fields_are_serialized() {
        let opts = EditExternalMonitorOptions {
            name: Some("homepage".to_string()),
            timeout: Some(10),
            sni: Some(true),
            is_ipv6: Some(false),
            ..Default::default()
        };
        assert_eq!(
            opts.to_form(),
            vec![
                ("name", "homepage".to_string()),
                ("timeout", "10".to_string()),
                ("sni", "1".to_string()),
                ("isIPv6", "0".to_string()),
            ]
        );
    }

    #[test]
    fn empty_string_is_still_sent_when_set() {
        let opts = EditExternalMonitorOptions {
            tag: Some(String::new()),
            ..Default::default()
        };
        assert!(!opts.is_empty());
        assert_eq!(opts.to_form(), vec![("tag", String::new())]);
    }

    #[test]
    fn merge_prefers_overrides() {
        let base = EditExternalMonitorOptions {
            name: Some("old".to_string()),
            url: Some("example.com".to_string()),
            ..Default::default()
        };
        let overrides = EditExternalMonitorOptions {
            name: Some("new".to_string()),
            uptime_sla: Some(99),
            ..Default::default()
        };
        let merged = base.merge(overrides);
        assert_eq!(merged.name.as_deref(), Some("new"));
        assert_eq!(merged.url.as_deref(), Some("example.com"));
        assert_eq!(merged.uptime_sla, Some(99));
        assert_eq!(merged.response_sla, None);
    }

    #[test]
    fn options_load_from_json() {
        let opts: EditExternalMonitorOptions =
            serde_json::from_str(r#"{"url": "example.com/health", "content_match_flag": 1}"#)
                .unwrap();
        assert_eq!(
            opts.to_form(),
            vec![
                ("url", "example.com/health".to_string()),
                ("contentMatchFlag", "1".to_string()),
            ]
        );
        assert!(serde_json::from_str::<EditExternalMonitorOptions>(r#"{"nmae": "x"}"#).is_err());
    }

    #[test]
    fn ok_envelope_is_success() {
        assert!(envelope(r#"{"error":"","status":"ok"}"#)
            .into_result()
            .is_ok());
        assert!(envelope(r#"{"status":"ok"}"#).into_result().is_ok());
    }

    #[test]
    fn null_error_counts_as_empty() {
        let output = envelope(r#"{"error":null,"status":"ok"}"#);
        assert_eq!(output.error, None);
        assert!(output.into_result().is_ok());
    }

    #[test]
    fn error_message_wins_over_status() {
        let err = envelope(r#"{"error":"bad url","status":"error"}"#)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().contains("bad url"));
    }

    #[test]
    fn non_ok_status_fails() {
        let err = envelope(r#"{"error":"","status":"Test not found"}"#)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::Status(Some(ref s)) if s == "Test not found"));
    }

    #[test]
    fn missing_status_fails() {
        let err = envelope(r#"{"error":""}"#).into_result().unwrap_err();
        assert!(matches!(err, Error::Status(None)));
    }
}
