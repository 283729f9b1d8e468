// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Keywords defined in iCalendar RFC 5545.

#![allow(missing_docs)]

pub const KW_BEGIN: &str = "BEGIN";
pub const KW_END: &str = "END";

// Section 3.6 - Calendar Components
pub const KW_VCALENDAR: &str = "VCALENDAR";
pub const KW_VEVENT: &str = "VEVENT";

// Section 3.2 - Property Parameters
pub const KW_TZID: &str = "TZID";
pub const KW_VALUE: &str = "VALUE";

// Section 3.3 - Property Value Data Types
pub const KW_DATE: &str = "DATE";
pub const KW_DATETIME: &str = "DATE-TIME";

// Section 3.7 - Calendar Properties
pub const KW_CALSCALE: &str = "CALSCALE";
pub const KW_CALSCALE_GREGORIAN: &str = "GREGORIAN";
pub const KW_PRODID: &str = "PRODID";
pub const KW_VERSION: &str = "VERSION";
pub const KW_VERSION_2_0: &str = "2.0";

// Section 3.8.1 - Descriptive Component Properties
pub const KW_DESCRIPTION: &str = "DESCRIPTION";
pub const KW_SUMMARY: &str = "SUMMARY";

// Section 3.8.2 - Date and Time Component Properties
pub const KW_DTEND: &str = "DTEND";
pub const KW_DTSTART: &str = "DTSTART";
pub const KW_DURATION: &str = "DURATION";

// Section 3.8.4 - Relationship Component Properties
pub const KW_RECURRENCE_ID: &str = "RECURRENCE-ID";
pub const KW_UID: &str = "UID";

// Section 3.8.5 - Recurrence Component Properties
pub const KW_EXDATE: &str = "EXDATE";
pub const KW_RDATE: &str = "RDATE";
pub const KW_RRULE: &str = "RRULE";

// Section 3.8.7 - Change Management Component Properties
pub const KW_DTSTAMP: &str = "DTSTAMP";

// Section 3.3.10 - Recurrence Rule
pub const KW_RRULE_FREQ: &str = "FREQ";
pub const KW_RRULE_UNTIL: &str = "UNTIL";
pub const KW_RRULE_COUNT: &str = "COUNT";
pub const KW_RRULE_INTERVAL: &str = "INTERVAL";
pub const KW_RRULE_BYSECOND: &str = "BYSECOND";
pub const KW_RRULE_BYMINUTE: &str = "BYMINUTE";
pub const KW_RRULE_BYHOUR: &str = "BYHOUR";
pub const KW_RRULE_BYDAY: &str = "BYDAY";
pub const KW_RRULE_BYMONTHDAY: &str = "BYMONTHDAY";
pub const KW_RRULE_BYYEARDAY: &str = "BYYEARDAY";
pub const KW_RRULE_BYWEEKNO: &str = "BYWEEKNO";
pub const KW_RRULE_BYMONTH: &str = "BYMONTH";
pub const KW_RRULE_BYSETPOS: &str = "BYSETPOS";
pub const KW_RRULE_WKST: &str = "WKST";

pub const KW_RRULE_FREQ_SECONDLY: &str = "SECONDLY";
pub const KW_RRULE_FREQ_MINUTELY: &str = "MINUTELY";
pub const KW_RRULE_FREQ_HOURLY: &str = "HOURLY";
pub const KW_RRULE_FREQ_DAILY: &str = "DAILY";
pub const KW_RRULE_FREQ_WEEKLY: &str = "WEEKLY";
pub const KW_RRULE_FREQ_MONTHLY: &str = "MONTHLY";
pub const KW_RRULE_FREQ_YEARLY: &str = "YEARLY";

pub const KW_DAY_SU: &str = "SU";
pub const KW_DAY_MO: &str = "MO";
pub const KW_DAY_TU: &str = "TU";
pub const KW_DAY_WE: &str = "WE";
pub const KW_DAY_TH: &str = "TH";
pub const KW_DAY_FR: &str = "FR";
pub const KW_DAY_SA: &str = "SA";
