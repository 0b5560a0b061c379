//! Full client/server round trips through the loopback transport.

#[cfg(test)]
mod tests {
    use authkey_client::{RequestSender, SenderOptions};
    use authkey_server::HandlerOptions;

    use crate::{Loopback, test_account};

    #[test]
    fn test_should_complete_exchange_with_unsigned_reply() {
        let mut sender = RequestSender::new(
            test_account(),
            SenderOptions::default(),
            Loopback::default(),
        );

        let exchange = sender
            .send("GET", "http://api.example.com/api?a=1", b"")
            .unwrap();
        assert_eq!(exchange.status, 200);
        assert_eq!(exchange.body, b"done");
        assert!(exchange.unsigned);
    }

    #[test]
    fn test_should_complete_strict_exchange_with_signed_reply() {
        let server = Loopback {
            options: HandlerOptions {
                strict: true,
                xheaders: vec![("status".to_owned(), "ok".to_owned())],
                ..HandlerOptions::default()
            },
            ..Loopback::default()
        };
        let mut sender = RequestSender::new(
            test_account(),
            SenderOptions {
                strict: true,
                ..SenderOptions::default()
            },
            server,
        );

        let exchange = sender
            .send("POST", "http://api.example.com/api", b"payload")
            .unwrap();
        assert!(!exchange.unsigned);
        assert_eq!(exchange.xheaders.get("status").map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_should_carry_xheaders_through_required_check() {
        let server = Loopback {
            required: "username, content-type".to_owned(),
            ..Loopback::default()
        };
        let mut sender = RequestSender::new(test_account(), SenderOptions::default(), server);
        sender.set_xheader("username", "fred");
        sender.set_xheader("content-type", "application/json");

        let exchange = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap();
        assert_eq!(exchange.status, 200);
    }

    #[test]
    fn test_should_survive_custom_protocol_configuration() {
        use authkey_core::AuthConfig;

        let auth = AuthConfig::new("X-Api-Auth", "HMAC", "acme", 300);
        let server = Loopback {
            options: HandlerOptions {
                auth: auth.clone(),
                strict: true,
                ..HandlerOptions::default()
            },
            ..Loopback::default()
        };
        let mut sender = RequestSender::new(
            test_account(),
            SenderOptions {
                strict: true,
                auth,
                ..SenderOptions::default()
            },
            server,
        );
        sender.set_xheader("username", "fred");

        let exchange = sender
            .send("GET", "http://api.example.com/api", b"")
            .unwrap();
        assert_eq!(exchange.status, 200);
        assert!(!exchange.unsigned);
    }
}
