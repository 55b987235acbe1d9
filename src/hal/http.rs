//! Blocking HTTP session for the PDU web interface.
//!
//! Backed by a `reqwest` blocking client with a cookie store, so the session
//! cookie set by the login form rides along on the outlet and logout
//! requests. A fresh client (and therefore a fresh cookie jar) is built for
//! every session.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::config::PduConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::traits::{WebClient, WebSessionFactory};

fn http_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Http(e.to_string())
}

fn final_url(response: Response) -> GatewayResult<String> {
    let response = response.error_for_status().map_err(http_error)?;
    Ok(response.url().as_str().to_string())
}

/// Builds cookie-backed [`HttpAgent`] sessions.
#[derive(Clone, Debug)]
pub struct HttpSessions {
    timeout: Duration,
}

impl HttpSessions {
    /// Sessions with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Sessions configured for the PDU.
    pub fn pdu(config: &PduConfig) -> Self {
        Self::new(config.timeout())
    }
}

impl WebSessionFactory for HttpSessions {
    type Client = HttpAgent;

    fn open(&self) -> GatewayResult<HttpAgent> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()
            .map_err(http_error)?;
        Ok(HttpAgent { client })
    }
}

/// One logged-in HTTP session.
#[derive(Debug)]
pub struct HttpAgent {
    client: Client,
}

impl WebClient for HttpAgent {
    fn post_form(&mut self, url: &str, form: &[(&str, &str)]) -> GatewayResult<String> {
        let response = self.client.post(url).form(form).send().map_err(http_error)?;
        final_url(response)
    }

    fn get(&mut self, url: &str) -> GatewayResult<String> {
        let response = self.client.get(url).send().map_err(http_error)?;
        final_url(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Read one request: the head up to the blank line, then the body.
    fn read_request(conn: &mut BufReader<std::net::TcpStream>) -> String {
        let mut head = String::new();
        loop {
            let mut line = String::new();
            conn.read_line(&mut line).unwrap();
            head.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        conn.read_exact(&mut body).unwrap();
        head + &String::from_utf8(body).unwrap()
    }

    /// Loopback web server answering one request per connection with the
    /// given responses in order. Joins with the requests it saw.
    fn web_server(responses: Vec<&'static str>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        let server = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (conn, _) = listener.accept().unwrap();
                let mut conn = BufReader::new(conn);
                requests.push(read_request(&mut conn));
                let head = format!("{}Content-Length: 0\r\nConnection: close\r\n\r\n", response);
                conn.get_mut().write_all(head.as_bytes()).unwrap();
            }
            requests
        });
        (base, server)
    }

    fn session() -> HttpAgent {
        HttpSessions::new(Duration::from_secs(5)).open().unwrap()
    }

    // =========================================================================
    // Redirects
    // =========================================================================

    #[test]
    fn get_returns_url_after_redirect() {
        let (base, server) = web_server(vec![
            "HTTP/1.1 302 Found\r\nLocation: /login.htm\r\n",
            "HTTP/1.1 200 OK\r\n",
        ]);

        let landing = session().get(&format!("{}/index.htm", base)).unwrap();
        assert_eq!(landing, format!("{}/login.htm", base));

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /index.htm "));
        assert!(requests[1].starts_with("GET /login.htm "));
    }

    #[test]
    fn get_without_redirect_returns_requested_url() {
        let (base, server) = web_server(vec!["HTTP/1.1 200 OK\r\n"]);
        let url = format!("{}/index.htm", base);
        assert_eq!(session().get(&url).unwrap(), url);
        server.join().unwrap();
    }

    #[test]
    fn error_status_is_http_error() {
        let (base, server) = web_server(vec!["HTTP/1.1 500 Internal Server Error\r\n"]);
        let err = session().get(&format!("{}/outlet?3=ON", base)).unwrap_err();
        assert!(matches!(err, GatewayError::Http(_)));
        server.join().unwrap();
    }

    // =========================================================================
    // Session cookies
    // =========================================================================

    #[test]
    fn login_cookie_rides_along_on_next_request() {
        let (base, server) = web_server(vec![
            "HTTP/1.1 200 OK\r\nSet-Cookie: session=pdu42; Path=/\r\n",
            "HTTP/1.1 200 OK\r\n",
        ]);

        let mut agent = session();
        agent
            .post_form(
                &format!("{}/login.tgi", base),
                &[("Username", "ops"), ("Password", "secret")],
            )
            .unwrap();
        agent.get(&format!("{}/index.htm", base)).unwrap();

        let requests = server.join().unwrap();
        let login = requests[0].to_ascii_lowercase();
        assert!(login.starts_with("post /login.tgi "));
        assert!(login.ends_with("username=ops&password=secret"));
        assert!(!login.contains("cookie:"));
        assert!(requests[1]
            .to_ascii_lowercase()
            .contains("cookie: session=pdu42"));
    }

    #[test]
    fn fresh_session_has_empty_cookie_jar() {
        let (base, server) = web_server(vec![
            "HTTP/1.1 200 OK\r\nSet-Cookie: session=pdu42; Path=/\r\n",
            "HTTP/1.1 200 OK\r\n",
        ]);

        session().get(&format!("{}/login.htm", base)).unwrap();
        session().get(&format!("{}/index.htm", base)).unwrap();

        let requests = server.join().unwrap();
        assert!(!requests[1].to_ascii_lowercase().contains("cookie:"));
    }
}
