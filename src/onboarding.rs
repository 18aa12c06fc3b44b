pub struct Slide {
    pub title: &'static str,
    pub body: &'static str,
}

pub const SLIDES: [Slide; 5] = [
    Slide {
        title: "Welcome",
        body: "This typewriter removes distractions\nand frees your mind to think.\n\nLet us show you how.",
    },
    Slide {
        title: "No Going Back",
        body: "You cannot delete what you write.\nYour mind stops editing itself\nand starts flowing.\n\nThink before you type.\nBe true to your thoughts.",
    },
    Slide {
        title: "Slow Down",
        body: "Type too fast\nand the machine jams.\n\nThis rhythm helps your thoughts\nform before they reach the page.\n\nLike breathing.\nLike walking.",
    },
    Slide {
        title: "Just You",
        body: "No spell check.\nNo suggestions.\nNo counts.\nNo menus.\n\nJust you\nand your thoughts.",
    },
    Slide {
        title: "The Journey",
        body: "No save button.\nNo files to manage.\nJust copy your words when done.\n\nFocus on the thinking,\nnot the document.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Finished,
}

#[derive(Debug, Default)]
pub struct Onboarding {
    slide: usize,
}

impl Onboarding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.slide
    }

    pub fn current(&self) -> &'static Slide {
        &SLIDES[self.slide]
    }

    pub fn next(&mut self) -> Step {
        if self.slide + 1 < SLIDES.len() {
            self.slide += 1;
            Step::Advanced
        } else {
            Step::Finished
        }
    }
}
