//! Built-in guide content.

use super::{Category, EmergencyGuide, GuideStep};

/// Every built-in guide, in display order.
pub static GUIDES: &[EmergencyGuide] = &[
    EmergencyGuide {
        id: "cpr",
        category: Category::Medical,
        title: "CPR",
        summary: "Start at once when the person is unresponsive and not breathing.",
        icon: "heart-pulse",
        quick_steps: &[
            "Call emergency services",
            "30 chest compressions",
            "2 rescue breaths",
            "Repeat until help arrives",
        ],
        steps: &[
            GuideStep::new(
                "Check response and breathing",
                "Tap both shoulders and shout. Watch the chest for 5-10 seconds. If there \
                 is no response and no normal breathing (or only gasping), start CPR now.",
            )
            .timed(10)
            .critical(),
            GuideStep::new(
                "Call for help",
                "Point at someone to call emergency services and send someone for the \
                 nearest AED.",
            ),
            GuideStep::new(
                "Chest compressions",
                "Heel of one hand on the centre of the chest, other hand on top. Push \
                 straight down 5-6 cm at 100-120 per minute and let the chest recoil fully.",
            )
            .rhythm(110),
            GuideStep::new(
                "Rescue breaths",
                "Tilt the head back and lift the chin. Pinch the nose and give 2 breaths \
                 of about 1 second each, watching the chest rise.",
            ),
        ],
    },
    EmergencyGuide {
        id: "choking",
        category: Category::Medical,
        title: "Choking (Heimlich manoeuvre)",
        summary: "For a conscious person who cannot breathe, speak or cough.",
        icon: "activity",
        quick_steps: &[
            "Recognise the choking sign",
            "Wrap arms around the waist",
            "Thrust inward and upward",
            "Repeat until the object comes out",
        ],
        steps: &[
            GuideStep::new(
                "Recognise the signs",
                "Hands clutching the throat, face turning blue, unable to talk or cough.",
            ),
            GuideStep::new(
                "Get into position",
                "Stand behind the person with one foot forward to keep your balance.",
            ),
            GuideStep::new(
                "Abdominal thrusts",
                "Place a fist two fingers above the navel, grasp it with the other hand \
                 and thrust sharply inward and upward.",
            )
            .critical(),
        ],
    },
    EmergencyGuide {
        id: "bleeding",
        category: Category::Medical,
        title: "Severe bleeding",
        summary: "Direct pressure is the first choice to stop bleeding.",
        icon: "droplet",
        quick_steps: &[
            "Find the source",
            "Press directly on it",
            "Pack the wound",
            "Tourniquet if needed",
        ],
        steps: &[
            GuideStep::new(
                "Expose the wound",
                "Cut away clothing and find exactly where the blood is coming from.",
            ),
            GuideStep::new(
                "Direct pressure",
                "Press clean gauze or cloth firmly onto the wound and keep pressing. Do \
                 not lift it to check.",
            )
            .timed(180)
            .critical(),
            GuideStep::new(
                "Pressure bandage",
                "Keep the dressing in place and wrap it tightly with a bandage. Raise the \
                 injured limb.",
            ),
        ],
    },
    EmergencyGuide {
        id: "stroke",
        category: Category::Medical,
        title: "Stroke",
        summary: "FAST: face drooping, arm weakness, speech difficulty, time to call.",
        icon: "brain",
        quick_steps: &[
            "Face: is one side drooping?",
            "Arms: can both be raised?",
            "Speech: is it slurred?",
            "Time: get to hospital now",
        ],
        steps: &[
            GuideStep::new(
                "Check FAST",
                "Ask them to smile, raise both arms and repeat a simple sentence. Look \
                 for a lopsided mouth, a weak arm or slurred words.",
            )
            .critical(),
            GuideStep::new(
                "Keep them lying still",
                "Lay them on their back with the head slightly raised. If they vomit, \
                 turn the head to the side. Give nothing to eat, drink or swallow.",
            ),
            GuideStep::new(
                "Note the time",
                "Write down when the symptoms started. Treatment options depend on it.",
            ),
        ],
    },
    EmergencyGuide {
        id: "burns",
        category: Category::Medical,
        title: "Burns and scalds",
        summary: "Cool, remove, soak, cover, get help.",
        icon: "thermometer-sun",
        quick_steps: &[
            "Cool under running water",
            "Carefully remove clothing",
            "Keep soaking in cool water",
            "Cover with clean gauze",
        ],
        steps: &[
            GuideStep::new(
                "Cool with running water",
                "Hold the burn under cool running water for 15-30 minutes until the \
                 pain eases. Do not put ice directly on it.",
            )
            .timed(900)
            .critical(),
            GuideStep::new(
                "Protect the wound",
                "Remove clothing around the burn unless it is stuck. Cover loosely with \
                 sterile gauze or clean cloth.",
            ),
            GuideStep::new(
                "Do not",
                "Do not apply toothpaste, sauces or home remedies. Do not burst blisters.",
            ),
        ],
    },
    EmergencyGuide {
        id: "fracture",
        category: Category::Medical,
        title: "Fractures",
        summary: "Immobilise the injury and never try to reset the bone.",
        icon: "bone",
        quick_steps: &[
            "Check the injury",
            "Stop movement",
            "Improvise a splint",
            "Cold pack for pain",
        ],
        steps: &[
            GuideStep::new(
                "Stop movement",
                "Do not move the injured part. If it must be moved, splint it first.",
            )
            .critical(),
            GuideStep::new(
                "Improvise a splint",
                "Use a board, branch or rolled-up magazine to fix the joints above and \
                 below the break.",
            ),
            GuideStep::new(
                "Open fractures",
                "If bone is showing, do not push it back. Stop the bleeding, cover with a \
                 sterile dressing, then splint.",
            ),
        ],
    },
    EmergencyGuide {
        id: "drowning",
        category: Category::Medical,
        title: "Drowning",
        summary: "Clear the airway and give rescue breaths before CPR.",
        icon: "waves",
        quick_steps: &[
            "Open the airway",
            "5 rescue breaths",
            "30 compressions",
            "Keep cycling",
        ],
        steps: &[
            GuideStep::new(
                "Clear the airway",
                "Once ashore, quickly clear the mouth and nose. Do not try to drain water \
                 by carrying them upside down; it only delays resuscitation.",
            )
            .critical(),
            GuideStep::new(
                "Breaths first",
                "Drowning starves the body of oxygen. Give 5 rescue breaths, then continue \
                 with cycles of 30 compressions and 2 breaths.",
            ),
            GuideStep::new(
                "Keep them warm",
                "Remove wet clothing and wrap them in a blanket to prevent hypothermia.",
            ),
        ],
    },
    EmergencyGuide {
        id: "fire",
        category: Category::Disaster,
        title: "Fire escape",
        summary: "Stay low, cover your mouth and nose, leave your belongings.",
        icon: "flame",
        quick_steps: &[
            "Wet towel over mouth and nose",
            "Crawl low",
            "Feel the door handle",
            "Never use the lift",
        ],
        steps: &[
            GuideStep::new(
                "Assess the fire",
                "If the door handle is hot, do not open it. Seal the gaps with wet cloth \
                 and signal for help from a window.",
            )
            .critical(),
            GuideStep::new(
                "Leave low",
                "Smoke rises, so the air near the floor is cleaner. Stoop or crawl out.",
            ),
        ],
    },
    EmergencyGuide {
        id: "snake",
        category: Category::Survival,
        title: "Snake and insect bites",
        summary: "Stay calm, note what bit you, keep movement to a minimum.",
        icon: "snail",
        quick_steps: &[
            "Move away from the animal",
            "Photograph or note its features",
            "Keep the limb low",
            "Rinse with clean water",
        ],
        steps: &[
            GuideStep::new(
                "Keep still",
                "Stay calm and do not run. Remove rings, bracelets and anything tight on \
                 the bitten limb.",
            )
            .critical(),
            GuideStep::new(
                "Clean the wound",
                "Rinse with clean or soapy water. Do not cut the wound or try to suck out \
                 venom.",
            ),
            GuideStep::new(
                "Bandage",
                "Apply a broad pressure bandage above the bite, loose enough to slip a \
                 finger under, to slow lymph flow.",
            ),
        ],
    },
];
