/// Logical structural roles the pipeline looks up in the page.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Role {
    ContentItem,
    ExcludedSection,
    TitleField,
    DescriptionField,
    ChannelField,
    PageContainer,
    TopicHeading,
    /// Whole page categories hidden by the injected stylesheet.
    HiddenCategory,
    /// Watch-page column that receives the topic header.
    Sidebar,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::ContentItem,
        Role::ExcludedSection,
        Role::TitleField,
        Role::DescriptionField,
        Role::ChannelField,
        Role::PageContainer,
        Role::TopicHeading,
        Role::HiddenCategory,
        Role::Sidebar,
    ];

    /// Roles the pipeline cannot work without. The rest may be left empty.
    pub const REQUIRED: [Role; 7] = [
        Role::ContentItem,
        Role::ExcludedSection,
        Role::TitleField,
        Role::DescriptionField,
        Role::ChannelField,
        Role::PageContainer,
        Role::TopicHeading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ContentItem => "content-item",
            Role::ExcludedSection => "excluded-section",
            Role::TitleField => "title-field",
            Role::DescriptionField => "description-field",
            Role::ChannelField => "channel-field",
            Role::PageContainer => "page-container",
            Role::TopicHeading => "topic-heading",
            Role::HiddenCategory => "hidden-category",
            Role::Sidebar => "sidebar",
        }
    }
}

/// A section removed only while the location path matches.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathExclusion {
    pub path: String,
    pub selector: String,
}

/// Role → selector table. Kept apart from the pipeline so that markup drift on the
/// host page only ever touches configuration.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(default, rename_all = "kebab-case"))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorTable {
    pub content_item: Vec<String>,
    pub excluded_section: Vec<String>,
    pub title_field: Vec<String>,
    pub description_field: Vec<String>,
    pub channel_field: Vec<String>,
    pub page_container: Vec<String>,
    pub topic_heading: Vec<String>,
    pub hidden_category: Vec<String>,
    pub sidebar: Vec<String>,
    pub path_exclusions: Vec<PathExclusion>,
}

impl SelectorTable {
    pub fn selectors(&self, role: Role) -> &[String] {
        match role {
            Role::ContentItem => &self.content_item,
            Role::ExcludedSection => &self.excluded_section,
            Role::TitleField => &self.title_field,
            Role::DescriptionField => &self.description_field,
            Role::ChannelField => &self.channel_field,
            Role::PageContainer => &self.page_container,
            Role::TopicHeading => &self.topic_heading,
            Role::HiddenCategory => &self.hidden_category,
            Role::Sidebar => &self.sidebar,
        }
    }

    /// Selector list for a role joined into one comma-separated group.
    pub fn group(&self, role: Role) -> String {
        self.selectors(role).join(", ")
    }

    /// Required roles that have no selector configured.
    pub fn missing_roles(&self) -> Vec<Role> {
        Role::REQUIRED
            .into_iter()
            .filter(|role| self.selectors(*role).iter().all(|s| s.trim().is_empty()))
            .collect()
    }

    /// Exclusions that apply to the given location path.
    pub fn exclusions_for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.path_exclusions
            .iter()
            .filter(move |rule| rule.path == path)
            .map(|rule| rule.selector.as_str())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            content_item: strings(&[
                "ytd-video-renderer",
                "ytd-grid-video-renderer",
                "ytd-compact-video-renderer",
                "ytd-rich-item-renderer",
                "ytd-reel-item-renderer",
            ]),
            excluded_section: strings(&["ytd-reel-shelf-renderer"]),
            title_field: strings(&["#video-title", "#video-title-link"]),
            description_field: strings(&["#description-text", "#metadata"]),
            channel_field: strings(&["#channel-name", "#text.ytd-channel-name"]),
            page_container: strings(&["ytd-app", "body"]),
            topic_heading: strings(&["h1.ytd-video-primary-info-renderer", "h1"]),
            hidden_category: strings(&[
                "ytd-browse[page-subtype=\"trending\"]",
                "ytd-browse[page-subtype=\"subscriptions\"] ytd-shelf-renderer",
                "ytd-browse[page-subtype=\"subscriptions\"] ytd-grid-renderer",
            ]),
            sidebar: strings(&["#secondary"]),
            path_exclusions: vec![PathExclusion {
                path: "/watch".to_string(),
                selector: "ytd-watch-next-secondary-results-renderer".to_string(),
            }],
        }
    }
}
