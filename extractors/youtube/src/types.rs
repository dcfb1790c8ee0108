pub mod response {
    pub mod parts {
        use serde::Deserialize;
        use serde_aux::prelude::*;

        /// One candidate of a `thumbnails` list
        #[derive(Deserialize, PartialEq, Eq, Hash, Default, Clone, Debug)]
        #[serde(rename_all = "camelCase")]
        pub struct Thumbnail {
            #[serde(default)]
            pub url: String,
            /// sometimes sent as a string
            #[serde(deserialize_with = "deserialize_number_from_string")]
            #[serde(default)]
            pub width: u64,
            #[serde(deserialize_with = "deserialize_number_from_string")]
            #[serde(default)]
            pub height: u64,
        }
    }
}

pub mod request {
    pub mod parts {
        use serde::Serialize;

        #[derive(SmartDefault, Serialize, Clone, Copy, Debug)]
        #[serde(rename_all = "camelCase")]
        pub struct ContextClient<'a> {
            pub hl: Option<&'a str>,
            pub gl: Option<&'a str>,
            pub client_name: &'a str,
            pub client_version: &'a str,
            #[default = 0]
            pub utc_offset_minutes: i16,
        }

        #[derive(Serialize, Default, Clone, Copy, Debug)]
        pub struct Empty {}

        #[derive(SmartDefault, Serialize, Clone, Debug)]
        #[serde(rename_all = "camelCase")]
        pub struct Context<'a> {
            pub client: ContextClient<'a>,
            pub request: Empty,
            pub user: Empty,
        }
    }

    use serde::Serialize;
    use tubescope_extractor_api::Locale;

    #[derive(SmartDefault, Serialize, Clone, Copy, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Client<'a> {
        pub context: parts::ContextClient<'a>,
        #[default = "m.youtube.com"]
        pub host: &'a str,
    }

    impl<'a> Client<'a> {
        /// Request context with the locale injected verbatim.
        pub fn context<'b>(&self, locale: &'b Locale) -> parts::Context<'b>
        where
            'a: 'b,
        {
            parts::Context {
                client: parts::ContextClient {
                    hl: Some(&locale.hl),
                    gl: Some(&locale.gl),
                    ..self.context
                },
                ..Default::default()
            }
        }
    }

    pub mod clients {
        use super::{parts::ContextClient, Client};

        /// the mobile website, which the page layouts we parse come from
        pub static MWEB: Client = Client {
            context: ContextClient {
                hl: None,
                gl: None,
                client_name: "MWEB",
                client_version: "2.20210711.08.00",
                utc_offset_minutes: 0,
            },
            host: "m.youtube.com",
        };
    }

    #[derive(SmartDefault, Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    /// `/youtubei/v1/browse`
    pub struct Browse<'a> {
        pub context: parts::Context<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub browse_id: Option<String>,
        /// Found next to the browse id in tab endpoints
        #[serde(skip_serializing_if = "Option::is_none")]
        pub params: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub continuation: Option<String>,
    }

    #[derive(SmartDefault, Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    /// `/youtubei/v1/search`
    pub struct Search<'a> {
        pub context: parts::Context<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub continuation: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tubescope_extractor_api::Locale;

    use super::request::{self, clients::MWEB};
    use super::response::parts::Thumbnail;

    #[test]
    fn continuation_body_carries_locale_and_token() {
        let locale = Locale::new("pl", "PL");
        let body = serde_json::to_value(request::Browse {
            context: MWEB.context(&locale),
            continuation: Some("4qmFsgKrCBIY".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "context": {
                    "client": {
                        "hl": "pl",
                        "gl": "PL",
                        "clientName": "MWEB",
                        "clientVersion": "2.20210711.08.00",
                        "utcOffsetMinutes": 0
                    },
                    "request": {},
                    "user": {}
                },
                "continuation": "4qmFsgKrCBIY"
            })
        );
    }

    #[test]
    fn thumbnail_width_from_string() {
        let t: Thumbnail =
            serde_json::from_value(json!({"url": "//yt3.ggpht.com/a", "width": "88"})).unwrap();
        assert_eq!(t.width, 88);
        assert_eq!(t.height, 0);
    }
}
