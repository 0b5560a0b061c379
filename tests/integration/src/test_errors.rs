//! Failure paths observed end to end through the loopback transport.

#[cfg(test)]
mod tests {
    use authkey_client::{RequestSender, SendError, SenderOptions};
    use authkey_core::Credentials;

    use crate::{Loopback, TEST_KEY, test_account};

    #[test]
    fn test_should_reject_unknown_account_with_403() {
        let mut sender = RequestSender::new(
            Credentials::new("who-is-this", TEST_KEY),
            SenderOptions::default(),
            Loopback::default(),
        );

        let err = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap_err();
        assert_eq!(err.to_string(), "RequestError: Unexpected status code 403");
    }

    #[test]
    fn test_should_return_json_error_body_for_denied_account() {
        use authkey_client::{HttpTransport, TransportRequest};
        use authkey_core::{AuthConfig, AuthContext};

        let ctx = AuthContext::for_request(
            AuthConfig::default(),
            &Credentials::new("who-is-this", TEST_KEY),
            "GET",
            "http://api.example.com/api?a=1",
            &[],
        )
        .unwrap();

        let mut server = Loopback::default();
        let response = server
            .execute(TransportRequest {
                method: "GET",
                url: "http://api.example.com/api?a=1",
                headers: &ctx.header_lines(),
                body: b"",
            })
            .unwrap();

        assert_eq!(response.status, 403);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["code"], "InvalidAccountId");
        assert_eq!(
            body["message"],
            "The AccountId you provided does not exist in our records"
        );
        assert_eq!(body["resource"], "/api");
        assert_eq!(body["query"], "a=1");
    }

    #[test]
    fn test_should_reject_wrong_key_with_403() {
        let mut sender = RequestSender::new(
            Credentials::new("example-id", "not-the-key"),
            SenderOptions::default(),
            Loopback::default(),
        );

        let err = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap_err();
        assert_eq!(err.to_string(), "RequestError: Unexpected status code 403");
    }

    #[test]
    fn test_should_reject_missing_required_xheader_with_400() {
        let server = Loopback {
            required: "username".to_owned(),
            ..Loopback::default()
        };
        let mut sender = RequestSender::new(test_account(), SenderOptions::default(), server);

        let err = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap_err();
        assert_eq!(err.to_string(), "RequestError: Unexpected status code 400");
    }

    #[test]
    fn test_should_reject_mismatched_protocol_configuration() {
        use authkey_core::AuthConfig;

        // server expects a different header name, so the request looks unsigned
        let server = Loopback {
            options: authkey_server::HandlerOptions {
                auth: AuthConfig::new("X-Api-Auth", "", "", 0),
                ..authkey_server::HandlerOptions::default()
            },
            ..Loopback::default()
        };
        let mut sender = RequestSender::new(test_account(), SenderOptions::default(), server);

        let err = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap_err();
        assert!(matches!(err, SendError::Request(_)));
    }

    #[test]
    fn test_should_fail_strict_client_against_lenient_server() {
        // the server never signs its reply; a strict client refuses it
        let mut sender = RequestSender::new(
            test_account(),
            SenderOptions {
                strict: true,
                ..SenderOptions::default()
            },
            Loopback::default(),
        );

        let err = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap_err();
        assert!(matches!(err, SendError::Response(_)));
    }
}
