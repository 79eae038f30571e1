use bon::Builder;
use der::asn1::{PrintableStringRef, SetOfVec};
use der::{Any, DateTime, Tag};
use time::{Date, Month, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use crate::error::{CertError, Result};

/// Subject identity placed into a certificate.
///
/// Fields are copied verbatim; nothing is normalized and duplicates across
/// certificates are allowed. Empty fields are left out of the encoded name.
/// The organizational unit is also written as the organization (O), so
/// consumers matching on either attribute see the same value.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `organizational_unit` - The organizational unit (OU).
/// * `serial_number` - The subject serial number, a decimal string. It is
///   also used as the certificate serial.
/// * `country` - The country code (C).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct Identity {
    #[builder(into)]
    pub common_name: String,
    #[builder(into, default)]
    pub organizational_unit: String,
    #[builder(into)]
    pub serial_number: String,
    #[builder(into, default)]
    pub country: String,
}

impl Identity {
    pub fn new(
        common_name: impl Into<String>,
        organizational_unit: impl Into<String>,
        serial_number: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            common_name: common_name.into(),
            organizational_unit: organizational_unit.into(),
            serial_number: serial_number.into(),
            country: country.into(),
        }
    }

    /// Converts the identity to an X.509 name.
    ///
    /// Attribute order is C, O, OU, CN, serialNumber. CN, O and OU are
    /// UTF8String; C and serialNumber are PrintableString.
    pub fn to_x509_name(&self) -> Result<Name> {
        use const_oid::db::rfc4519;

        let mut rdns = Vec::new();
        if !self.country.is_empty() {
            rdns.push(printable_rdn(rfc4519::C, &self.country)?);
        }
        if !self.organizational_unit.is_empty() {
            rdns.push(utf8_rdn(rfc4519::O, &self.organizational_unit)?);
            rdns.push(utf8_rdn(rfc4519::OU, &self.organizational_unit)?);
        }
        if !self.common_name.is_empty() {
            rdns.push(utf8_rdn(rfc4519::CN, &self.common_name)?);
        }
        if !self.serial_number.is_empty() {
            rdns.push(printable_rdn(rfc4519::SERIAL_NUMBER, &self.serial_number)?);
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads the identity back out of an X.509 name. Attributes this type
    /// doesn't model are ignored.
    pub fn from_x509_name(name: &Name) -> Result<Self> {
        use const_oid::db::rfc4519;

        let mut identity = Identity::default();
        for rdn in name.0.iter() {
            for attr in rdn.0.iter() {
                let slot = match attr.oid {
                    rfc4519::CN => &mut identity.common_name,
                    rfc4519::OU => &mut identity.organizational_unit,
                    rfc4519::C => &mut identity.country,
                    rfc4519::SERIAL_NUMBER => &mut identity.serial_number,
                    _ => continue,
                };
                *slot = String::from_utf8(attr.value.value().to_vec())
                    .map_err(|e| CertError::DecodingError(e.to_string()))?;
            }
        }
        Ok(identity)
    }
}

fn utf8_rdn(oid: const_oid::ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    single_rdn(oid, Any::new(Tag::Utf8String, value.as_bytes())?)
}

fn printable_rdn(
    oid: const_oid::ObjectIdentifier,
    value: &str,
) -> Result<RelativeDistinguishedName> {
    let value = PrintableStringRef::new(value)
        .map_err(|e| CertError::EncodingError(format!("{value:?} is not printable: {e}")))?;
    single_rdn(oid, Any::new(Tag::PrintableString, value.as_str().as_bytes())?)
}

fn single_rdn(oid: const_oid::ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName> {
    let atv = AttributeTypeAndValue { oid, value };
    Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
}

/// Certificate validity period.
///
/// Both ends are whole seconds in UTC so that the encoded certificate
/// carries exactly these instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of years.
    pub fn for_years(years: u32) -> Result<Self> {
        let now = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|e| CertError::InvalidValidityError(e.to_string()))?;
        Self::starting_at(now, years)
    }

    /// Creates a validity period of `years` calendar years from `not_before`.
    pub fn starting_at(not_before: OffsetDateTime, years: u32) -> Result<Self> {
        if years == 0 {
            return Err(CertError::InvalidValidityError(
                "validity must be at least one year".to_string(),
            ));
        }
        let not_after = add_years(not_before, years)?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    pub(crate) fn to_x509(self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub(crate) fn from_x509(validity: &x509_cert::time::Validity) -> Result<Self> {
        Ok(Self {
            not_before: from_x509_time(validity.not_before)?,
            not_after: from_x509_time(validity.not_after)?,
        })
    }
}

/// Adds calendar years; Feb 29 in a non-leap target year becomes Mar 1.
fn add_years(start: OffsetDateTime, years: u32) -> Result<OffsetDateTime> {
    let year = i32::try_from(years)
        .ok()
        .and_then(|years| start.year().checked_add(years))
        .ok_or_else(|| CertError::InvalidValidityError(format!("{years} years is out of range")))?;
    match start.replace_year(year) {
        Ok(shifted) => Ok(shifted),
        Err(_) if start.month() == Month::February && start.day() == 29 => {
            let date = Date::from_calendar_date(year, Month::March, 1)
                .map_err(|e| CertError::InvalidValidityError(e.to_string()))?;
            Ok(start.replace_date(date))
        }
        Err(e) => Err(CertError::InvalidValidityError(e.to_string())),
    }
}

/// RFC 5280: UTCTime through 2049, GeneralizedTime from 2050 on.
fn to_x509_time(instant: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let secs = u64::try_from(instant.unix_timestamp()).map_err(|_| {
        CertError::InvalidValidityError(format!("{instant} is before the Unix epoch"))
    })?;
    let date_time = DateTime::from_unix_duration(core::time::Duration::from_secs(secs))?;
    if instant.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(der::asn1::UtcTime::from_date_time(date_time)?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            der::asn1::GeneralizedTime::from_date_time(date_time),
        ))
    }
}

fn from_x509_time(time: x509_cert::time::Time) -> Result<OffsetDateTime> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| CertError::DecodingError(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| CertError::DecodingError(e.to_string()))
}

/// CA constraints of a certificate.
///
/// `max_path_len` of `Some(0)` is a meaningful zero (may sign leaves only),
/// distinct from `None` (no limit).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    pub is_ca: bool,
    pub basic_constraints_valid: bool,
    pub max_path_len: Option<u8>,
}

impl Constraints {
    pub fn ca(max_path_len: u8) -> Self {
        Self {
            is_ca: true,
            basic_constraints_valid: true,
            max_path_len: Some(max_path_len),
        }
    }

    pub fn leaf() -> Self {
        Self::default()
    }

    pub fn max_path_len_zero(&self) -> bool {
        self.max_path_len == Some(0)
    }
}
