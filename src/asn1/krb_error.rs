use super::constants::{KrbErrorCode, KrbMessageType};
use super::kerberos_string::KerberosString;
use super::kerberos_time::{split_system_time, KerberosTime};
use super::microseconds::Microseconds;
use super::pa_data::MethodData;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use crate::constants::PVNO;
use crate::error::KrbError;
use der::asn1::OctetString;
use der::{Encode, Sequence};
use std::time::SystemTime;
use tracing::error;

/// ```text
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (30),
///         ctime           [2] KerberosTime OPTIONAL,
///         cusec           [3] Microseconds OPTIONAL,
///         stime           [4] KerberosTime,
///         susec           [5] Microseconds,
///         error-code      [6] Int32,
///         crealm          [7] Realm OPTIONAL,
///         cname           [8] PrincipalName OPTIONAL,
///         realm           [9] Realm -- service realm --,
///         sname           [10] PrincipalName -- service name --,
///         e-text          [11] KerberosString OPTIONAL,
///         e-data          [12] OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbErrorMessageInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2", optional = "true")]
    pub ctime: Option<KerberosTime>,
    #[asn1(context_specific = "3", optional = "true")]
    pub cusec: Option<Microseconds>,
    #[asn1(context_specific = "4")]
    pub stime: KerberosTime,
    #[asn1(context_specific = "5")]
    pub susec: Microseconds,
    #[asn1(context_specific = "6")]
    pub error_code: i32,
    #[asn1(context_specific = "7", optional = "true")]
    pub crealm: Option<Realm>,
    #[asn1(context_specific = "8", optional = "true")]
    pub cname: Option<PrincipalName>,
    #[asn1(context_specific = "9")]
    pub service_realm: Realm,
    #[asn1(context_specific = "10")]
    pub service_name: PrincipalName,
    #[asn1(context_specific = "11", optional = "true")]
    pub error_text: Option<KerberosString>,
    #[asn1(context_specific = "12", optional = "true")]
    pub error_data: Option<OctetString>,
}

application_tagged!(KrbErrorMessage, KrbErrorMessageInner, 30);

impl KrbErrorMessageInner {
    /// The code as a known value, `None` when the peer sent one outside RFC 4120 7.5.9.
    pub fn code(&self) -> Option<KrbErrorCode> {
        KrbErrorCode::try_from(self.error_code).ok()
    }

    /// When the e-data carries METHOD-DATA (as for KDC_ERR_PREAUTH_REQUIRED), decode it.
    pub fn method_data(&self) -> Option<MethodData> {
        self.error_data
            .as_ref()
            .and_then(|data| super::decode::<MethodData>(data.as_bytes()).ok())
    }
}

/// Assembles a KRB-ERROR for a peer. Only the code, the server time and the service
/// identity are required.
pub struct KrbErrorBuilder {
    code: KrbErrorCode,
    stime: SystemTime,
    service_realm: Realm,
    service_name: PrincipalName,
    client: Option<(Realm, PrincipalName)>,
    client_time: Option<SystemTime>,
    error_text: Option<String>,
    error_data: Option<Vec<u8>>,
}

impl KrbErrorBuilder {
    pub fn new(
        code: KrbErrorCode,
        stime: SystemTime,
        service_realm: Realm,
        service_name: PrincipalName,
    ) -> Self {
        Self {
            code,
            stime,
            service_realm,
            service_name,
            client: None,
            client_time: None,
            error_text: None,
            error_data: None,
        }
    }

    /// Reports a local failure. The code is derived from the error, nothing else
    /// about it reaches the peer.
    pub fn from_error(
        err: &KrbError,
        stime: SystemTime,
        service_realm: Realm,
        service_name: PrincipalName,
    ) -> Self {
        Self::new(err.error_code(), stime, service_realm, service_name)
    }

    pub fn client(mut self, crealm: Realm, cname: PrincipalName) -> Self {
        self.client = Some((crealm, cname));
        self
    }

    /// Echo the client's ctime/cusec, as is done for KRB_AP_ERR_SKEW.
    pub fn client_time(mut self, ctime: SystemTime) -> Self {
        self.client_time = Some(ctime);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.error_text = Some(text.to_string());
        self
    }

    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.error_data = Some(data);
        self
    }

    pub fn method_data(self, method_data: &MethodData) -> Result<Self, KrbError> {
        let data = method_data.to_der().map_err(|err| {
            error!(?err, "Unable to encode method data");
            KrbError::DerEncodeMessage
        })?;
        Ok(self.data(data))
    }

    pub fn build(self) -> Result<KrbErrorMessage, KrbError> {
        let (stime, susec) = split_system_time(self.stime)?;
        let (ctime, cusec) = match self.client_time {
            Some(t) => {
                let (ctime, cusec) = split_system_time(t)?;
                (Some(ctime), Some(cusec))
            }
            None => (None, None),
        };
        let (crealm, cname) = match self.client {
            Some((crealm, cname)) => (Some(crealm), Some(cname)),
            None => (None, None),
        };
        let error_text = self
            .error_text
            .as_deref()
            .map(KerberosString::try_from)
            .transpose()?;
        let error_data = self
            .error_data
            .map(OctetString::new)
            .transpose()
            .map_err(|_| KrbError::DerEncodeOctetString)?;

        Ok(KrbErrorMessage::new(KrbErrorMessageInner {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbError.into(),
            ctime,
            cusec,
            stime,
            susec,
            error_code: self.code.into(),
            crealm,
            cname,
            service_realm: self.service_realm,
            service_name: self.service_name,
            error_text,
            error_data,
        }))
    }
}
