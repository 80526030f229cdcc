//! `dig` lookup output

use super::cached_regex;

/// Outcome of one dig query
#[derive(Debug, Clone, PartialEq)]
pub struct DigAnswer {
    /// Header status, e.g. `NOERROR` or `NXDOMAIN`
    pub status: Option<String>,
    /// Whether an ANSWER SECTION was printed
    pub answered: bool,
    pub query_time_ms: Option<f64>,
    /// Server address from `;; SERVER: 192.168.1.1#53(...)`
    pub server: Option<String>,
}

impl DigAnswer {
    pub fn is_success(&self) -> bool {
        self.answered
    }
}

/// Extract the result of a dig query. Returns `None` when the output is not
/// a dig response at all (e.g. `connection timed out`).
pub fn parse_dig(text: &str) -> Option<DigAnswer> {
    let status = cached_regex!(r"status: ([A-Z]+)")
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let query_time_ms = cached_regex!(r"Query time:\s*(\d+)\s*msec")
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1)?.as_str().parse().ok());

    let server = cached_regex!(r";; SERVER: ([^#\s]+)#")
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    if status.is_none() && query_time_ms.is_none() {
        return None;
    }

    Some(DigAnswer {
        status,
        answered: text.contains("ANSWER SECTION"),
        query_time_ms,
        server,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answered_query() {
        let text = "\
; <<>> DiG 9.10.6 <<>> +time=3 +tries=1 google.com
;; global options: +cmd
;; Got answer:
;; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 12345
;; flags: qr rd ra; QUERY: 1, ANSWER: 1, AUTHORITY: 0, ADDITIONAL: 1

;; QUESTION SECTION:
;google.com.\t\t\tIN\tA

;; ANSWER SECTION:
google.com.\t\t183\tIN\tA\t142.250.185.78

;; Query time: 23 msec
;; SERVER: 192.168.1.1#53(192.168.1.1)
;; WHEN: Mon Jan 15 10:00:00 CET 2024
;; MSG SIZE  rcvd: 55
";
        let answer = parse_dig(text).unwrap();
        assert!(answer.is_success());
        assert_eq!(answer.status.as_deref(), Some("NOERROR"));
        assert_eq!(answer.query_time_ms, Some(23.0));
        assert_eq!(answer.server.as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn test_nxdomain_is_not_success() {
        let text = "\
;; ->>HEADER<<- opcode: QUERY, status: NXDOMAIN, id: 999
;; flags: qr rd ra; QUERY: 1, ANSWER: 0, AUTHORITY: 1, ADDITIONAL: 1

;; AUTHORITY SECTION:
.\t\t86400\tIN\tSOA\ta.root-servers.net. nstld.verisign-grs.com. 1 1800 900 604800 86400

;; Query time: 41 msec
";
        let answer = parse_dig(text).unwrap();
        assert!(!answer.is_success());
        assert_eq!(answer.status.as_deref(), Some("NXDOMAIN"));
    }

    #[test]
    fn test_timeout_output() {
        let text = ";; connection timed out; no servers could be reached\n";
        assert!(parse_dig(text).is_none());
    }
}
