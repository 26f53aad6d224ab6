//! Request classification.

use http::{Method, Uri};
use stashbox_core::{FetchRequest, Origin, RequestClass};

use crate::config::RouteConfig;

/// Decides whether a request is intercepted and which class it belongs to.
///
/// ```
/// use stashbox::Classifier;
/// use stashbox::config::RouteConfig;
/// use stashbox_core::{Origin, RequestClass};
///
/// let classifier = Classifier::new(
///     Origin::parse("https://benefits.example").unwrap(),
///     RouteConfig::default(),
/// );
/// let uri = "https://benefits.example/assets/benefits/gym.webp".parse().unwrap();
/// assert_eq!(classifier.classify(&uri), RequestClass::ImageAsset);
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    routes: RouteConfig,
}

impl Classifier {
    /// Creates a classifier for pages served from `origin`.
    pub fn new(origin: Origin, routes: RouteConfig) -> Self {
        Self { origin, routes }
    }

    /// The page origin.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Classifies `uri` by the shape of its path alone.
    pub fn classify(&self, uri: &Uri) -> RequestClass {
        let path = uri.path();
        if path.contains(self.routes.image_segment.as_str()) {
            RequestClass::ImageAsset
        } else if path.contains(self.routes.asset_segment.as_str()) {
            RequestClass::StaticAsset
        } else {
            RequestClass::DocumentOrData
        }
    }

    /// Returns `true` if the controller handles `request`.
    ///
    /// Cross-origin requests and anything but `GET` go to the network
    /// untouched.
    pub fn intercepts(&self, request: &FetchRequest) -> bool {
        *request.method() == Method::GET && self.origin.is_same_origin(request.uri())
    }
}
