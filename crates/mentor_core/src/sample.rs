//! Bundled reference set: five Python and five mathematics questions.

use crate::model::QaRecord;

const SAMPLE: &[(&str, &str, &str)] = &[
    (
        "python",
        "What is a list in Python?",
        "A list is a built-in data structure in Python that stores ordered collections of items. Lists are mutable, meaning you can modify them after creation. They are created using square brackets [].",
    ),
    (
        "python",
        "How do you create a function in Python?",
        "You create a function in Python using the 'def' keyword, followed by the function name and parentheses containing parameters. Use a colon and indent the function body.",
    ),
    (
        "python",
        "What is the difference between a list and a tuple?",
        "Lists are mutable (can be changed) and use square brackets []. Tuples are immutable (cannot be changed) and use parentheses (). Lists are generally used for homogeneous items, tuples for heterogeneous data.",
    ),
    (
        "python",
        "How do you handle exceptions in Python?",
        "Use try-except blocks to handle exceptions in Python. The code that might raise an exception goes in the try block, and the error handling code goes in the except block.",
    ),
    (
        "python",
        "What is a dictionary in Python?",
        "A dictionary is a built-in data structure that stores key-value pairs. Dictionaries are mutable and unordered. They are created using curly braces {} with key:value pairs.",
    ),
    (
        "math",
        "What is the Pythagorean theorem?",
        "The Pythagorean theorem states that in a right triangle, the square of the hypotenuse equals the sum of squares of the other two sides: a² + b² = c²",
    ),
    (
        "math",
        "What is the derivative of x²?",
        "The derivative of x² is 2x. This follows the power rule where d/dx(x^n) = n*x^(n-1).",
    ),
    (
        "math",
        "What is a prime number?",
        "A prime number is a natural number greater than 1 that has no positive divisors other than 1 and itself. Examples include 2, 3, 5, 7, 11, etc.",
    ),
    (
        "math",
        "How do you calculate the area of a circle?",
        "The area of a circle is calculated using the formula A = πr², where r is the radius of the circle and π (pi) is approximately 3.14159.",
    ),
    (
        "math",
        "What is the quadratic formula?",
        "The quadratic formula is x = (-b ± √(b²-4ac)) / 2a. It's used to solve quadratic equations of the form ax² + bx + c = 0.",
    ),
];

pub fn sample_records() -> Vec<QaRecord> {
    SAMPLE
        .iter()
        .map(|(topic, question, answer)| QaRecord::new(*question, *answer, *topic))
        .collect()
}
